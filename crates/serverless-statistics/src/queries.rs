// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Logs Insights query templates.
//!
//! Lambda names log streams `YYYY/MM/DD/[<version>]<id>`, so each template
//! scopes itself to one version with a `@logStream` regex containing a single
//! `{qualifier}` placeholder. Use [`render`] to fill it.

const PLACEHOLDER: &str = "{qualifier}";

/// Characters with a meaning inside a Logs Insights `/regex/` literal.
const RESERVED: &[char] = &[
    '\\', '/', '$', '^', '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|',
];

pub const TIMEOUT_COUNT: &str = r#"
filter @message like /Status: timeout/ and @logStream like /\[{qualifier}\]/
| stats count_distinct(@requestId) as timeoutCount
"#;

pub const UNIQUE_REQUESTS: &str = r#"
filter @logStream like /\[{qualifier}\]/
| stats count_distinct(@requestId) as invocationsCount
"#;

pub const ERROR_COUNT: &str = r#"
filter @message like /(?i)(ERROR)/ and @logStream like /\[{qualifier}\]/
| stats count_distinct(@requestId) as errorCount
"#;

pub const COLD_START_RATE: &str = r#"
filter @type = "REPORT" and @logStream like /\[{qualifier}\]/
| parse @message /REPORT RequestId: (?<requestId>[a-f0-9-]+)/
| stats
    count_distinct(requestId) as totalInvocations,
    sum(strcontains(@message, "Init Duration")) as coldStartLines
"#;

pub const ERROR_CATEGORIES: &str = r#"
filter @message =~ /(?i)\[ERROR\]/ and @logStream like /\[{qualifier}\]/
| parse @message /\[ERROR\]\s+(?<error_type>[^ :]+)[ :]*(?<error_details>.*)?/
| parse error_details /(?<specific_error>.*?)\s*when calling/
| parse error_details /An error occurred \((?<aws_error_code>\w+)\)/
| stats
    count() as error_count
    by coalesce(aws_error_code, specific_error, error_type, "UnknownError") as error_category
| sort error_count desc
"#;

pub const DURATION: &str = r#"
fields @timestamp, @message
| parse @message "Duration: * ms" as durationMs
| filter ispresent(durationMs) and @logStream like /\[{qualifier}\]/
"#;

pub const COLD_START_DURATION: &str = r#"
fields @timestamp, @message
| filter strcontains(@message, "Init Duration") and @logStream like /\[{qualifier}\]/
| parse @message "Init Duration: * ms" as coldStartDurationMs
| filter ispresent(coldStartDurationMs)
"#;

pub const MEMORY_UTILIZATION: &str = r#"
parse @message "Memory Size: * MB\tMax Memory Used: * MB" as memorySize, maxMemoryUsed
| filter ispresent(memorySize) and ispresent(maxMemoryUsed) and @logStream like /\[{qualifier}\]/
| display @timestamp, memorySize, maxMemoryUsed, maxMemoryUsed / memorySize as memoryUtilizationRatio
"#;

pub const BILLED_DURATION: &str = r#"
filter @type = "REPORT" and @logStream like /\[{qualifier}\]/
| stats sum(@duration) as totalDuration, sum(@billedDuration) as totalBilledDuration
"#;

/// Backslash-escapes every regex metacharacter, e.g. `$LATEST` → `\$LATEST`.
pub fn escape_qualifier(qualifier: &str) -> String {
    let mut escaped = String::with_capacity(qualifier.len() + 2);
    for c in qualifier.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Substitutes the escaped qualifier into `template`.
pub fn render(template: &str, qualifier: &str) -> String {
    template.replacen(PLACEHOLDER, &escape_qualifier(qualifier), 1)
}
