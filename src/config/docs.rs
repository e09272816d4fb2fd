//! Config field documentation, the single source of truth for descriptions.
//!
//! Used by:
//! - `promptbatch config show` to annotate TOML output with inline comments
//! - `cargo xtask gen-docs` to generate `docs/CONFIGURATION.md`

use std::collections::HashMap;

/// Documentation for a config section.
pub struct SectionDoc {
    /// TOML section name (e.g., "paths", "retry")
    pub name: &'static str,
    /// Human-readable description of the section
    pub description: &'static str,
    /// Fields in this section
    pub fields: &'static [FieldDoc],
}

/// Documentation for a config field.
pub struct FieldDoc {
    /// Field name as it appears in TOML
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Default value as a display string
    pub default_display: &'static str,
}

/// Config sections in canonical display order.
pub const CONFIG_SECTIONS: &[SectionDoc] = &[
    SectionDoc {
        name: "paths",
        description: "Where inputs, prompt templates and results live",
        fields: &[
            FieldDoc {
                name: "input_dir",
                description: "Directory scanned for .md/.txt inputs when no files are given",
                default_display: "\"book_1\"",
            },
            FieldDoc {
                name: "prompts_dir",
                description: "Directory that --prompt ids are resolved against",
                default_display: "\"prompts\"",
            },
            FieldDoc {
                name: "output_dir",
                description: "Root of the <Provider>/<name>_<tag>.md output tree",
                default_display: "\"book_2\"",
            },
        ],
    },
    SectionDoc {
        name: "rate_limit",
        description: "Minimum spacing between remote calls",
        fields: &[
            FieldDoc {
                name: "wait_minutes",
                description: "Minutes to wait between two files (at most 1440)",
                default_display: "1.0",
            },
            FieldDoc {
                name: "show_progress",
                description: "Draw a progress bar while waiting",
                default_display: "true",
            },
        ],
    },
    SectionDoc {
        name: "retry",
        description: "Retries for transient provider failures",
        fields: &[
            FieldDoc {
                name: "max_retries",
                description: "Attempts per file, including the first",
                default_display: "3",
            },
            FieldDoc {
                name: "backoff_base_secs",
                description: "Fixed seconds added to every backoff (at most 3600)",
                default_display: "10",
            },
            FieldDoc {
                name: "backoff_growth",
                description: "Backoff grows by growth^attempt seconds (at most 60)",
                default_display: "5",
            },
        ],
    },
    SectionDoc {
        name: "pacing",
        description: "Fixed courtesy delays around each call (not part of the retry policy)",
        fields: &[
            FieldDoc {
                name: "thinking_secs",
                description: "Pause before the first attempt",
                default_display: "15",
            },
            FieldDoc {
                name: "settle_secs",
                description: "Pause after a successful response",
                default_display: "10",
            },
            FieldDoc {
                name: "prime_settle_secs",
                description: "Pause between Kimi's priming request and the real request",
                default_display: "10",
            },
        ],
    },
    SectionDoc {
        name: "batch",
        description: "Failure handling for a batch",
        fields: &[
            FieldDoc {
                name: "failure_threshold",
                description: "Back-to-back failures before pausing for a decision",
                default_display: "3",
            },
            FieldDoc {
                name: "on_consecutive_failures",
                description: "ask | continue | halt",
                default_display: "\"ask\"",
            },
            FieldDoc {
                name: "on_failed_jobs",
                description: "ask | now | slower | never",
                default_display: "\"ask\"",
            },
        ],
    },
    SectionDoc {
        name: "providers",
        description: "Provider selection",
        fields: &[
            FieldDoc {
                name: "default",
                description: "Provider used when --provider is not given (gemini, kimi, deepseek)",
                default_display: "\"gemini\"",
            },
            FieldDoc {
                name: "request_timeout_secs",
                description: "HTTP request timeout",
                default_display: "120",
            },
        ],
    },
];

/// Provider subsections sharing [`PROVIDER_FIELDS`].
pub const PROVIDER_SECTIONS: [&str; 3] =
    ["providers.gemini", "providers.kimi", "providers.deepseek"];

/// Per-provider fields, documented once for all provider subsections.
pub const PROVIDER_FIELDS: &[FieldDoc] = &[
    FieldDoc {
        name: "model",
        description: "Model identifier (see `promptbatch providers`)",
        default_display: "\"<built-in default>\"",
    },
    FieldDoc {
        name: "api_key_env",
        description: "Environment variable holding the API key",
        default_display: "\"<PROVIDER>_API_KEY\"",
    },
    FieldDoc {
        name: "api_key",
        description: "API key stored in the config (overrides api_key_env)",
        default_display: "\"\"",
    },
    FieldDoc {
        name: "base_url",
        description: "Alternative API endpoint",
        default_display: "\"<official endpoint>\"",
    },
];

/// Extract the section name from a `[section]` header line.
fn section_name(trimmed: &str) -> Option<&str> {
    if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
        Some(
            trimmed
                .trim_start_matches('[')
                .split(']')
                .next()
                .unwrap_or("")
                .trim(),
        )
    } else {
        None
    }
}

/// Insert commented-out template lines for optional fields that are absent.
///
/// Scans the TOML string for known sections and appends `# field = example`
/// lines for any documented fields not already present. This lets users
/// discover all available options even when their default is "unset".
pub fn insert_optional_field_templates(toml_str: &str) -> String {
    let mut lines: Vec<String> = toml_str.lines().map(|l| l.to_string()).collect();

    // Collect present fields per section
    let mut present: HashMap<String, Vec<String>> = HashMap::new();
    let mut current_section = String::new();
    for line in &lines {
        let trimmed = line.trim();
        if let Some(name) = section_name(trimmed) {
            current_section = name.to_string();
        } else if let Some((before_eq, _)) = trimmed.split_once('=') {
            let before_eq = before_eq.trim();
            let key = before_eq.strip_prefix('#').unwrap_or(before_eq).trim();
            if !key.is_empty() {
                present
                    .entry(current_section.clone())
                    .or_default()
                    .push(key.to_string());
            }
        }
    }

    let section_fields: Vec<(&str, &[FieldDoc])> = CONFIG_SECTIONS
        .iter()
        .map(|s| (s.name, s.fields))
        .chain(PROVIDER_SECTIONS.iter().map(|name| (*name, PROVIDER_FIELDS)))
        .collect();

    // Process sections in reverse so line insertions don't shift indices
    for (section, fields) in section_fields.iter().rev() {
        let section_present = present.get(*section);
        let missing: Vec<&FieldDoc> = fields
            .iter()
            .filter(|f| {
                section_present
                    .map(|p| !p.iter().any(|k| k == f.name))
                    .unwrap_or(true)
            })
            .collect();

        if missing.is_empty() {
            continue;
        }

        let header = format!("[{}]", section);
        let Some(start) = lines.iter().position(|l| l.trim() == header) else {
            continue;
        };
        let section_end = lines[start + 1..]
            .iter()
            .position(|l| section_name(l.trim()).is_some())
            .map(|i| start + 1 + i)
            .unwrap_or(lines.len());

        let mut last_content = start;
        for (i, line) in lines.iter().enumerate().take(section_end).skip(start + 1) {
            if !line.trim().is_empty() {
                last_content = i;
            }
        }

        for (i, field) in missing.iter().enumerate() {
            lines.insert(
                last_content + 1 + i,
                format!("# {} = {}", field.name, field.default_display),
            );
        }
    }

    let mut result = lines.join("\n");
    if !result.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// Annotate a serialized TOML config string with inline documentation comments.
///
/// Inserts `# description` comments above each known field.
pub fn annotate_config(toml_str: &str) -> String {
    let mut lookup: HashMap<(&str, &str), &str> = HashMap::new();
    for section in CONFIG_SECTIONS {
        for field in section.fields {
            lookup.insert((section.name, field.name), field.description);
        }
    }
    for section in PROVIDER_SECTIONS {
        for field in PROVIDER_FIELDS {
            lookup.insert((section, field.name), field.description);
        }
    }

    let mut result = String::new();
    let mut current_section = String::new();

    for line in toml_str.lines() {
        let trimmed = line.trim();

        if let Some(name) = section_name(trimmed) {
            current_section = name.to_string();
        } else if let Some((before_eq, _)) = trimmed.split_once('=') {
            let raw_key = before_eq.trim();
            let key = raw_key.strip_prefix('#').unwrap_or(raw_key).trim();
            if let Some(desc) = lookup.get(&(current_section.as_str(), key)) {
                result.push_str(&format!("# {}\n", desc));
            }
        }

        result.push_str(line);
        result.push('\n');
    }

    result
}

/// Generate the configuration reference page as markdown.
pub fn generate_config_markdown() -> String {
    let mut md = String::new();

    md.push_str(
        "<!-- This file is auto-generated by `cargo xtask gen-docs`. Do not edit manually. -->\n\n",
    );
    md.push_str("# Configuration\n\n");
    md.push_str(
        "promptbatch reads a TOML configuration file at `~/.config/promptbatch/config.toml`.\n",
    );
    md.push_str("Command-line flags override the file, which overrides the built-in defaults.\n\n");
    md.push_str("## Quick Commands\n\n");
    md.push_str("```bash\n");
    md.push_str("promptbatch config show   # View the effective configuration\n");
    md.push_str("promptbatch config path   # Print the config file location\n");
    md.push_str("promptbatch config init   # Write a default config file\n");
    md.push_str("```\n\n");
    md.push_str("## Configuration Sections\n\n");

    for section in CONFIG_SECTIONS {
        push_table(&mut md, &format!("[{}]", section.name), section.description, section.fields);
    }

    push_table(
        &mut md,
        "[providers.\\<name\\>]",
        "Per-provider overrides. Applies to `[providers.gemini]`, `[providers.kimi]`, `[providers.deepseek]`.",
        PROVIDER_FIELDS,
    );

    md.push_str("## Example Configuration\n\n");
    md.push_str("```toml\n");
    md.push_str("[rate_limit]\n");
    md.push_str("wait_minutes = 2.0\n\n");
    md.push_str("[batch]\n");
    md.push_str("on_consecutive_failures = \"halt\"\n");
    md.push_str("on_failed_jobs = \"slower\"\n\n");
    md.push_str("[providers]\n");
    md.push_str("default = \"deepseek\"\n\n");
    md.push_str("[providers.gemini]\n");
    md.push_str("model = \"gemini-1.5-pro\"\n");
    md.push_str("```\n");

    md
}

fn push_table(md: &mut String, title: &str, description: &str, fields: &[FieldDoc]) {
    md.push_str(&format!("### {}\n\n", title));
    md.push_str(&format!("{}\n\n", description));
    md.push_str("| Option | Default | Description |\n");
    md.push_str("|--------|---------|-------------|\n");
    for field in fields {
        md.push_str(&format!(
            "| `{}` | `{}` | {} |\n",
            field.name, field.default_display, field.description
        ));
    }
    md.push('\n');
}
