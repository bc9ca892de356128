use sentry_log_target::app;

fn main() -> anyhow::Result<()> {
    app::main()
}
