// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log formatting for hosts embedding this crate.
//!
//! Lines are prefixed with `SERVERLESS_STATS` so they can be told apart from
//! the host's own output:
//!
//! ```text
//! SERVERLESS_STATS | DEBUG | Started Logs Insights query query_id=q-1
//! SERVERLESS_STATS | WARN | metric{metric="duration_statistics" function="checkout" qualifier="$LATEST"}: could not parse durationMs value "n/a" as a number, skipping row
//! ```

use crate::config::StatsConfig;
use crate::error::StatsError;
use std::fmt;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

const PREFIX: &str = "SERVERLESS_STATS";

/// Formatter writing `SERVERLESS_STATS | LEVEL | [spans: ]message fields`.
#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(&mut writer, "{PREFIX} | {} | ", event.metadata().level())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                // Populated by the fmt layer on span creation.
                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Filter directive for `log_level`, with the HTTP stack silenced.
pub fn env_filter(log_level: &str) -> Result<EnvFilter, StatsError> {
    EnvFilter::try_new(format!("h2=off,hyper=off,rustls=off,{log_level}"))
        .map_err(|e| StatsError::InvalidConfig(format!("could not parse log level: {e}")))
}

/// Installs a global subscriber using [`Formatter`]. Output is plain text,
/// without ANSI styling, since it usually ends up in CloudWatch.
pub fn init(log_level: &str) -> Result<(), StatsError> {
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter(log_level)?)
        .with_ansi(false)
        .event_format(Formatter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| StatsError::InvalidConfig(format!("setting default subscriber failed: {e}")))
}

/// [`init`] at the level configured in `config`.
pub fn init_from(config: &StatsConfig) -> Result<(), StatsError> {
    init(&config.log_level)
}
