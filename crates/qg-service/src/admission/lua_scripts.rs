//! Lua scripts for the Redis counter store.
//!
//! Redis runs each script atomically, so the prune, count, insert and
//! expire steps of the sliding window can never interleave with another
//! caller's steps for the same key.

/// Sliding-window admit-or-reject for one key.
///
/// Arguments:
/// - KEYS[1]: Rate window key (e.g., `rate_limit:7:user123:products`)
/// - ARGV[1]: Now, in microseconds
/// - ARGV[2]: Window start, in microseconds
/// - ARGV[3]: Maximum admitted entries in the window
/// - ARGV[4]: Key TTL, in milliseconds
/// - ARGV[5]: Member to insert (unique per request)
///
/// Timestamps are passed through to Redis as the caller's strings. Lua
/// numbers print with 14 significant digits, which would truncate
/// microsecond scores.
///
/// Returns:
/// - 1: Admitted (entry recorded, expiry refreshed)
/// - 0: Rejected (window full, nothing recorded)
/// - -1: Error (non-numeric arguments)
pub const SLIDING_WINDOW_ADMIT: &str = r#"
local now = tonumber(ARGV[1])
local window_start = tonumber(ARGV[2])
local max_requests = tonumber(ARGV[3])
local ttl_ms = tonumber(ARGV[4])

if now == nil or window_start == nil or max_requests == nil or ttl_ms == nil then
    return -1
end

-- Entries at or before the window start have aged out
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', ARGV[2])

-- Every remaining entry counts, including ones stamped after ARGV[1]
-- by an instance whose clock runs ahead or a request that overtook this one
local count = redis.call('ZCARD', KEYS[1])
if count >= max_requests then
    return 0
end

redis.call('ZADD', KEYS[1], ARGV[1], ARGV[5])
redis.call('PEXPIRE', KEYS[1], ttl_ms)
return 1
"#;
