mod campaigns;
mod docs;
mod health_check;
mod metrics;

pub use campaigns::create_campaign as post_campaign;
pub use campaigns::get_campaign as get_campaign_by_id;
pub use campaigns::list_campaigns as get_campaigns;
pub use docs::openapi_yaml;
pub use docs::swagger_ui;
pub use health_check::health_check;
pub use metrics::metrics;

/// Prints an error and its full `source()` chain, one cause per line.
/// Shared by every `ResponseError` impl in this module so a 500 body never
/// flattens the chain down to its outermost `Display`.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }
    Ok(())
}
