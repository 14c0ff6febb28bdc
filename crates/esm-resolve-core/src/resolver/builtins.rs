//! The host platform's built-in module names.

/// Namespace prefix accepted in front of every built-in name.
pub const NODE_PREFIX: &str = "node:";

/// Bare built-in module names.
pub const BUILTIN_MODULES: &[&str] = &[
    "_http_agent",
    "_http_client",
    "_http_common",
    "_http_incoming",
    "_http_outgoing",
    "_http_server",
    "_stream_duplex",
    "_stream_passthrough",
    "_stream_readable",
    "_stream_transform",
    "_stream_wrap",
    "_stream_writable",
    "_tls_common",
    "_tls_wrap",
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "inspector/promises",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Built-ins that only exist under the `node:` namespace.
pub const PREFIX_ONLY_MODULES: &[&str] = &["sea", "sqlite", "test", "test/reporters"];

/// Whether `name` is a built-in, with or without the `node:` prefix.
#[must_use]
pub fn is_builtin(name: &str) -> bool {
    match name.strip_prefix(NODE_PREFIX) {
        Some(bare) => BUILTIN_MODULES.contains(&bare) || PREFIX_ONLY_MODULES.contains(&bare),
        None => BUILTIN_MODULES.contains(&name),
    }
}
