// Structured logging init, grounded in the `log` facade the teacher uses
// throughout `vm.rs`/`render.rs`, wired to `env_logger`'s `RUST_LOG`
// convention (the simpler alternative to the pack's `fern`-based setup in
// quarylabs-sqruff, chosen because this crate has no per-module log-file
// routing to justify `fern`'s extra ceremony).

pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}
