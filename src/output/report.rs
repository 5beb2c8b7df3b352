use super::ReportSink;
use crate::analysis::AnalysisResult;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

const WRAP_WIDTH: usize = 70;
const SEPARATOR: &str = "--------------------------------------------------";
const ANGLE_MARKER: &str = "body is at a ";

const RECOMMENDATIONS: [&str; 4] = [
    "Focus on core strength and body awareness exercises to improve overall body alignment",
    "Practice stroke-specific drills to address individual technique issues",
    "Utilize underwater video analysis for visual feedback on body position",
    "Work with a coach on mental cues for maintaining proper alignment during swims",
];

const NEXT_STEPS: [&str; 3] = [
    "Develop a targeted training plan addressing key areas for improvement",
    "Schedule follow-up analysis in 3 months to assess progress",
    "Consider additional equipment like alignment boards or snorkels for technique work",
];

/// Writes the report to a plain text file
pub struct TextFileReport {
    path: PathBuf,
}

impl TextFileReport {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for TextFileReport {
    fn write_report(&mut self, report: &str) -> Result<()> {
        fs::write(&self.path, report).with_context(|| format!("Failed to write {}", self.path.display()))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Render the report, hand it to `sink` and return the text
///
/// A failed write is logged and does not lose the report: the text is
/// returned either way.
pub fn generate_report<S>(results: &BTreeMap<String, AnalysisResult>, sink: &mut S, top_n: usize) -> String
where
    S: ReportSink + ?Sized,
{
    let date = chrono::Local::now().format("%B %d, %Y").to_string();
    let report = render_report(results, &date, top_n);

    match sink.write_report(&report) {
        Ok(()) => tracing::info!("Report generated successfully as '{}'", sink.location()),
        Err(e) if e.downcast_ref::<io::Error>().is_some() => tracing::error!("Error writing to file: {:#}", e),
        Err(e) => tracing::error!("An unexpected error occurred: {:#}", e),
    }

    report
}

/// Format all video results into the coaching report
///
/// Each list shows at most `top_n` items per video.
pub fn render_report(results: &BTreeMap<String, AnalysisResult>, date: &str, top_n: usize) -> String {
    let mut report = vec![
        "Swimming Performance Analysis Report".to_string(),
        "Athlete: [Name]".to_string(),
        format!("Date: {date}"),
        "\nExecutive Summary:".to_string(),
    ];

    let angles: Vec<f64> = results
        .values()
        .flat_map(|result| result.improvements.iter().filter_map(|item| body_angle(item)))
        .collect();
    let average = if angles.is_empty() {
        0.0
    } else {
        angles.iter().sum::<f64>() / angles.len() as f64
    };

    report.push(format!(
        "The analysis reveals an average body angle deviation of {average:.1} degrees from horizontal across all strokes."
    ));
    report.push("This indicates a need for focused improvement in maintaining a streamlined position.".to_string());

    report.push("\nStroke-specific Analysis:".to_string());

    for (video, result) in results {
        report.push(format!("\n{} (from {}):", result.stroke, video));

        report.push("Areas for Improvement:".to_string());
        report.extend(result.improvements.iter().take(top_n).map(|item| bullet(item)));

        report.push("\nStrengths:".to_string());
        report.extend(result.positives.iter().take(top_n).map(|item| bullet(item)));

        report.push(SEPARATOR.to_string());

        if !result.equipment.is_empty() {
            report.push("\nEquipment Detected:".to_string());
            report.extend(result.equipment.iter().map(|item| format!("- {item}")));
        }

        report.push(SEPARATOR.to_string());
    }

    report.push("\nOverall Recommendations:".to_string());
    report.extend(RECOMMENDATIONS.iter().enumerate().map(|(i, rec)| format!("{}. {}", i + 1, rec)));

    report.push("\nNext Steps:".to_string());
    report.extend(NEXT_STEPS.iter().enumerate().map(|(i, step)| format!("{}. {}", i + 1, step)));

    report.join("\n")
}

/// Body angle embedded in an alignment remark, if any
fn body_angle(item: &str) -> Option<f64> {
    let (_, rest) = item.split_once(ANGLE_MARKER)?;
    rest.split_whitespace().next()?.parse().ok()
}

/// Word-wrap an item as a `- ` bullet with a two-space hanging indent
fn bullet(item: &str) -> String {
    let mut lines = Vec::new();
    let mut line = String::from("- ");
    let mut line_has_words = false;

    for word in item.split_whitespace() {
        if line_has_words && line.len() + 1 + word.len() > WRAP_WIDTH {
            lines.push(std::mem::replace(&mut line, String::from("  ")));
            line_has_words = false;
        }
        if line_has_words {
            line.push(' ');
        }
        line.push_str(word);
        line_has_words = true;
    }
    lines.push(line);

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Stroke;

    fn result(stroke: Stroke, improvements: &[&str], positives: &[&str]) -> AnalysisResult {
        AnalysisResult {
            stroke,
            improvements: improvements.iter().map(|s| s.to_string()).collect(),
            positives: positives.iter().map(|s| s.to_string()).collect(),
            equipment: Vec::new(),
        }
    }

    struct FailingSink;

    impl ReportSink for FailingSink {
        fn write_report(&mut self, _report: &str) -> Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into())
        }

        fn location(&self) -> String {
            "nowhere".to_string()
        }
    }

    #[test]
    fn test_truncates_to_top_n() {
        let items: Vec<String> = (1..=8).map(|i| format!("Improvement {i}")).collect();
        let refs: Vec<&str> = items.iter().map(String::as_str).collect();
        let positives: Vec<String> = (1..=7).map(|i| format!("Strength {i}")).collect();
        let positive_refs: Vec<&str> = positives.iter().map(String::as_str).collect();

        let mut results = BTreeMap::new();
        results.insert("lap.mp4".to_string(), result(Stroke::Freestyle, &refs, &positive_refs));

        let report = render_report(&results, "October 16, 2026", 5);

        assert!(report.contains("- Improvement 5"));
        assert!(!report.contains("- Improvement 6"));
        assert!(report.contains("- Strength 5"));
        assert!(!report.contains("- Strength 6"));
        assert!(report.contains("\nFreestyle (from lap.mp4):"));
    }

    #[test]
    fn test_average_body_angle() {
        let mut results = BTreeMap::new();
        results.insert(
            "a.mp4".to_string(),
            result(
                Stroke::Freestyle,
                &["Improve body alignment: Your body is at a 12.0 degree angle. Aim for a more horizontal position"],
                &[],
            ),
        );
        results.insert(
            "b.mov".to_string(),
            result(
                Stroke::Backstroke,
                &["Improve body position: Your body is at a 20.6 degree angle. Aim for a more horizontal position"],
                &[],
            ),
        );

        let report = render_report(&results, "October 16, 2026", 5);
        assert!(report.contains("average body angle deviation of 16.3 degrees"));
    }

    #[test]
    fn test_no_angles_averages_zero() {
        let report = render_report(&BTreeMap::new(), "October 16, 2026", 5);
        assert!(report.starts_with("Swimming Performance Analysis Report\nAthlete: [Name]\nDate: October 16, 2026\n"));
        assert!(report.contains("deviation of 0.0 degrees"));
        assert!(report.ends_with("3. Consider additional equipment like alignment boards or snorkels for technique work"));
    }

    #[test]
    fn test_bullet_wraps_at_seventy() {
        let text = "Extend your arms further: Reach forward more on each stroke to maximize your distance per stroke";
        let wrapped = bullet(text);
        let lines: Vec<&str> = wrapped.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("- Extend"));
        assert!(lines[1].starts_with("  "));
        assert!(lines.iter().all(|line| line.len() <= WRAP_WIDTH));
        assert_eq!(wrapped.split_whitespace().collect::<Vec<_>>().join(" "), format!("- {text}"));
    }

    #[test]
    fn test_failed_write_still_returns_report() {
        let mut results = BTreeMap::new();
        results.insert("a.mp4".to_string(), result(Stroke::Butterfly, &["Improve X"], &["Good Y"]));

        let report = generate_report(&results, &mut FailingSink, 5);
        assert!(report.contains("Butterfly (from a.mp4):"));
        assert!(report.contains("- Improve X"));
    }

    #[test]
    fn test_text_file_sink_writes() {
        let path = std::env::temp_dir().join(format!("swim-coach-report-{}.txt", std::process::id()));
        let mut sink = TextFileReport::new(&path);
        sink.write_report("hello").unwrap();
        let written = fs::read_to_string(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(written, "hello");
    }
}
