//! Connectivity probe.

use panreport_core::ConnectionStatus;

use crate::Context;
use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;
use crate::progress::Spinner;

/// Print the probe verdict; anything but `connected` is also an error exit.
pub async fn handle(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let spinner = Spinner::start("Probing firewall API...", global.quiet);
    let report = ctx.session.test_connection().await;
    spinner.finish();

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            output::detail(&[
                ("status", output::paint_status(r.status, color)),
                ("message", r.message.clone()),
                ("cached", r.cached.to_string()),
            ])
        },
        |r| r.status.to_string(),
    );
    output::print_output(&out, global.quiet);

    match report.status {
        ConnectionStatus::Connected => Ok(()),
        ConnectionStatus::Unconfigured => Err(CliError::Unconfigured),
        ConnectionStatus::Error | ConnectionStatus::Unknown => Err(CliError::ConnectionFailed {
            url: ctx.session.settings().await.base_url,
            reason: report.message,
        }),
    }
}
