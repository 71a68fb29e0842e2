//! Output formatters: console, JSON and Markdown renderings of a match report

use crate::config::OutputFormat;
use crate::error::{MatcherError, Result};
use crate::output::report::{score_label, MatchReport, RankedMatch};
use crate::processing::profile::ExtractedProfile;
use colored::{Color, Colorize};
use std::path::Path;

pub trait OutputFormatter {
    fn format_report(&self, report: &MatchReport) -> Result<String>;
    fn format_profile(&self, profile: &ExtractedProfile) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Dispatches a report to the formatter for the requested format.
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };
        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: f32) -> String {
        let label = score_label(score);
        let color = match label {
            "EXCELLENT" => Color::Green,
            "VERY GOOD" => Color::BrightGreen,
            "GOOD" => Color::Yellow,
            "FAIR" => Color::BrightYellow,
            "BELOW AVG" => Color::Red,
            _ => Color::BrightRed,
        };

        if self.use_colors {
            format!("[{}]", label.color(color).bold())
        } else {
            format!("[{}]", label)
        }
    }

    fn format_bar(&self, score: f32) -> String {
        let filled = (score / 10.0).round().clamp(0.0, 10.0) as usize;
        format!("{}{}", "■".repeat(filled), "·".repeat(10 - filled))
    }

    fn format_match(&self, entry: &RankedMatch) -> String {
        let mut output = String::new();
        let result = &entry.result;

        let mut heading = format!("#{} {}", entry.rank, entry.title);
        if let Some(company) = &entry.company {
            heading.push_str(&format!(" @ {}", company));
        }
        output.push_str(&self.format_header(&heading, 2));
        output.push_str(&format!(
            "Score: {:.1} {}  (id: {})\n",
            result.score,
            self.format_score_badge(result.score),
            result.posting_id
        ));
        if let Some(location) = &entry.location {
            output.push_str(&format!("Location: {}\n", location));
        }

        for (name, score, weight) in result.breakdown.components() {
            output.push_str(&format!(
                "  {:<20} {} {:>5.1}  (weight {:.0}%)\n",
                name,
                self.format_bar(score),
                score,
                weight * 100.0
            ));
        }

        if !result.matched_skills.is_empty() {
            output.push_str(&format!(
                "Matched skills: {}\n",
                self.colorize(&result.matched_skills.join(", "), Color::Green)
            ));
        }
        if !result.missing_skills.is_empty() {
            output.push_str(&format!(
                "Missing skills: {}\n",
                self.colorize(&result.missing_skills.join(", "), Color::Red)
            ));
        }
        if self.detailed {
            output.push_str(&format!(
                "Keyword similarity (TF-IDF): {:.1}\n",
                result.keyword_similarity
            ));
        }
        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &MatchReport) -> Result<String> {
        let mut output = String::new();
        let meta = &report.metadata;

        output.push_str(&self.format_header("JOB MATCH REPORT", 1));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms\n",
            meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            meta.processing_time_ms
        ));
        output.push_str(&format!(
            "Resume: {} | Postings: {} ({} considered, {} shown)\n",
            meta.resume_file,
            meta.postings_file,
            meta.postings_considered,
            report.matches.len()
        ));

        if report.matches.is_empty() {
            output.push_str(&self.colorize("\nNo postings met the criteria.\n", Color::Yellow));
        }
        for entry in &report.matches {
            output.push_str(&self.format_match(entry));
        }

        if self.detailed {
            output.push_str(&self.format_header("Profile", 2));
            output.push_str(&self.format_profile(&report.profile)?);
            output.push_str(&format!(
                "\nModel: {} | Vocabulary: {} | As of: {}\n",
                meta.embedding_model, meta.vocabulary_version, meta.as_of
            ));
        }
        Ok(output)
    }

    fn format_profile(&self, profile: &ExtractedProfile) -> Result<String> {
        let mut output = String::new();
        output.push_str(&format!(
            "Experience: {:.1} years across {} positions\n",
            profile.years_experience,
            profile.work_history.len()
        ));

        if let Some(contact) = contact_line(profile) {
            output.push_str(&format!("Contact: {}\n", contact));
        }

        let skills: Vec<&str> = profile.skills.iter().map(String::as_str).collect();
        output.push_str(&format!(
            "Skills ({}): {}\n",
            skills.len(),
            self.colorize(&skills.join(", "), Color::Cyan)
        ));
        if self.detailed {
            for (category, names) in &profile.skill_categories {
                output.push_str(&format!(
                    "  {}: {}\n",
                    category,
                    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
                ));
            }
        }

        for span in &profile.work_history {
            output.push_str(&format!(
                "  • {} - {}  {}{}\n",
                span.start.format("%Y-%m"),
                span.end.format("%Y-%m"),
                span.title.as_deref().unwrap_or("(untitled)"),
                span.organization
                    .as_deref()
                    .map(|o| format!(" | {}", o))
                    .unwrap_or_default()
            ));
        }
        for record in &profile.education {
            output.push_str(&format!("  🎓 {}\n", record.degree));
        }
        if self.detailed && !profile.summary.is_empty() {
            output.push_str(&format!("Summary: {}\n", profile.summary));
        }
        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &MatchReport) -> Result<String> {
        self.to_json(report)
    }

    fn format_profile(&self, profile: &ExtractedProfile) -> Result<String> {
        self.to_json(profile)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn markdown_score_badge(score: f32) -> &'static str {
        match score_label(score) {
            "EXCELLENT" => "🟢 Excellent",
            "VERY GOOD" => "🟡 Very Good",
            "GOOD" => "🟠 Good",
            "FAIR" => "🔴 Fair",
            "BELOW AVG" => "🔴 Below Average",
            _ => "🔴 Poor",
        }
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &MatchReport) -> Result<String> {
        let mut output = String::new();
        let meta = &report.metadata;

        output.push_str("# Job Match Report\n\n");
        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Processing Time:** {}ms\n",
                meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                meta.processing_time_ms
            ));
            output.push_str(&format!(
                "**Resume:** `{}` | **Postings:** `{}` | **Vocabulary:** `{}`\n\n",
                file_name(&meta.resume_file),
                file_name(&meta.postings_file),
                meta.vocabulary_version
            ));
        }

        output.push_str("## Ranking\n\n");
        output.push_str("| # | Posting | Score | Skills | Semantic | Experience | Location | Salary |\n");
        output.push_str("|---|---------|-------|--------|----------|------------|----------|--------|\n");
        for entry in &report.matches {
            let b = &entry.result.breakdown;
            output.push_str(&format!(
                "| {} | {} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} |\n",
                entry.rank,
                entry.title.replace('|', "\\|"),
                entry.result.score,
                b.skill_match,
                b.semantic_similarity,
                b.experience_match,
                b.location_match,
                b.salary_match
            ));
        }

        for entry in &report.matches {
            let result = &entry.result;
            output.push_str(&format!("\n### {}. {}\n\n", entry.rank, entry.title));
            output.push_str(&format!(
                "**Score:** {:.1} {}\n\n",
                result.score,
                Self::markdown_score_badge(result.score)
            ));
            if let Some(company) = &entry.company {
                output.push_str(&format!("- **Company:** {}\n", company));
            }
            if let Some(location) = &entry.location {
                output.push_str(&format!("- **Location:** {}\n", location));
            }
            if !result.matched_skills.is_empty() {
                output.push_str(&format!("- **Matched:** {}\n", result.matched_skills.join(", ")));
            }
            if !result.missing_skills.is_empty() {
                output.push_str(&format!("- **Missing:** {}\n", result.missing_skills.join(", ")));
            }
        }

        output.push_str("\n## Profile\n\n");
        output.push_str(&self.format_profile(&report.profile)?);
        Ok(output)
    }

    fn format_profile(&self, profile: &ExtractedProfile) -> Result<String> {
        let mut output = String::new();
        if let Some(contact) = contact_line(profile) {
            output.push_str(&format!("- **Contact:** {}\n", contact));
        }
        output.push_str(&format!("- **Experience:** {:.1} years\n", profile.years_experience));
        if profile.skill_categories.is_empty() {
            output.push_str(&format!(
                "- **Skills:** {}\n",
                profile.skills.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
            ));
        } else {
            output.push_str("- **Skills:**\n");
            for (category, names) in &profile.skill_categories {
                output.push_str(&format!(
                    "  - {}: {}\n",
                    category,
                    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
                ));
            }
        }
        for record in &profile.education {
            output.push_str(&format!("- **Education:** {}\n", record.degree));
        }
        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false, true, true)
    }

    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    fn formatter(&self, format: OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
        }
    }

    pub fn generate_report(&self, report: &MatchReport, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_report(report)
    }

    pub fn generate_profile(&self, profile: &ExtractedProfile, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_profile(profile)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn contact_line(profile: &ExtractedProfile) -> Option<String> {
    let contact = &profile.contact;
    let parts: Vec<&str> = [&contact.email, &contact.phone, &contact.location]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .collect();
    (!parts.is_empty()).then(|| parts.join(" | "))
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content).map_err(|e| {
        MatcherError::OutputFormatting(format!("Failed to write {}: {}", file_path.display(), e))
    })
}

pub fn suggest_filename(format: OutputFormat, resume_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    match format {
        OutputFormat::Console => format!("{}_matches{}.txt", base_name, timestamp_suffix),
        OutputFormat::Json => format!("{}_matches{}.json", base_name, timestamp_suffix),
        OutputFormat::Markdown => format!("{}_matches{}.md", base_name, timestamp_suffix),
    }
}
