/// Lua script for atomic download admission.
///
/// KEYS\[1\] = the drop's counter key (`drop:<id>:downloads`)
/// ARGV\[1\] = maximum allowed downloads
///
/// Increments the counter; on its first increment the key gets a 24 hour
/// TTL so abandoned counters do not accumulate. Returns 1 if the new count
/// is within the limit, 0 if the budget is exhausted.
pub const INCREMENT_AND_CHECK: &str = r"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], 86400)
end
if current > tonumber(ARGV[1]) then
    return 0
end
return 1
";
