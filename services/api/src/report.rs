use clap::Args;
use mariner_qhse::error::AppError;
use mariner_qhse::workflows::compatibility::{assess, CompatibilityReport, CompatibilityRequest};
use mariner_qhse::workflows::documents::{DocumentKind, Revision, SequenceScope};
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct CompatArgs {
    /// JSON file with `stbl`, `ss`, and optional `options` objects
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RevisionArgs {
    /// Current revision label, e.g. 1.0 or 2.3
    pub(crate) label: String,
}

pub(crate) fn run_kinds() -> Result<(), AppError> {
    print!("{}", render_kinds());
    Ok(())
}

pub(crate) fn run_compat(args: CompatArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.input)?;
    let request: CompatibilityRequest = serde_json::from_str(&raw)?;
    let report = assess(&request);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_compatibility(&report));
    }
    Ok(())
}

pub(crate) fn run_revision(args: RevisionArgs) -> Result<(), AppError> {
    let current = Revision::parse(&args.label)?;
    println!("{} -> {}", current, current.next());
    Ok(())
}

pub(crate) fn render_kinds() -> String {
    let mut out = String::from("Document kinds\n");
    for kind in DocumentKind::ALL {
        let spec = kind.spec();
        let sequence = match spec.sequence_scope {
            SequenceScope::PerYear => format!("{}-YYYY-NNN", spec.prefix),
            SequenceScope::Global => format!("{}-NNNN", spec.prefix),
        };
        let _ = writeln!(
            out,
            "- {} ({}): {}, closes as {}, up to {} MB [{}]{}{}",
            kind.label(),
            kind.slug(),
            sequence,
            spec.final_status.label(),
            spec.max_upload_bytes / (1024 * 1024),
            spec.allowed_extensions.join(", "),
            if spec.allows_draft { ", drafts" } else { "" },
            if spec.allows_resubmission {
                ", resubmittable"
            } else {
                ""
            },
        );
    }
    out
}

pub(crate) fn render_compatibility(report: &CompatibilityReport) -> String {
    let mut out = String::from("STS compatibility\n");
    let stbl = report.stbl.name.as_deref().unwrap_or("STBL");
    let ss = report.ss.name.as_deref().unwrap_or("SS");

    let _ = writeln!(out, "\nFreeboard (m)");
    let _ = writeln!(
        out,
        "- {stbl}: max {}, min {}, Cm {}",
        dash(report.stbl.max_freeboard, 2),
        dash(report.stbl.min_freeboard, 2),
        dash(report.stbl.added_mass_coefficient, 3)
    );
    let _ = writeln!(
        out,
        "- {ss}: max {}, min {}, Cm {}",
        dash(report.ss.max_freeboard, 2),
        dash(report.ss.min_freeboard, 2),
        dash(report.ss.added_mass_coefficient, 3)
    );
    let _ = writeln!(
        out,
        "- pair: max {}, min {}, difference {}",
        dash(report.freeboard.max_freeboard, 2),
        dash(report.freeboard.min_freeboard, 2),
        dash(report.freeboard.freeboard_diff, 2)
    );

    let _ = writeln!(out, "\nCargo hose");
    let _ = writeln!(out, "- minimum length: {} m", dash(report.hose_length, 0));

    let _ = writeln!(out, "\nFendering");
    let _ = writeln!(
        out,
        "- virtual displacement: {} t",
        dash(report.virtual_displacement, 0)
    );
    let _ = writeln!(
        out,
        "- berthing energy: {} kJ (design {} kJ)",
        dash(report.berthing_energy, 1),
        dash(report.design_energy, 1)
    );
    let fender = report
        .selected_fender
        .map(|fender| format!("{} m ({} kJ)", fender.designation, fender.rated_energy_kj))
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "- primary fender: {fender}");
    let count = report
        .primary_fender_count
        .map(|count| count.to_string())
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "- primary fenders required: {count}");
    out
}

fn dash(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(value) => format!("{value:.precision$}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mariner_qhse::workflows::compatibility::VesselParticulars;

    #[test]
    fn kinds_listing_covers_every_kind() {
        let listing = render_kinds();
        assert_eq!(listing.lines().count(), DocumentKind::ALL.len() + 1);
        assert!(listing.contains("DP-YYYY-NNN"));
        assert!(listing.contains("VA-NNNN"));
    }

    #[test]
    fn missing_figures_render_as_dashes() {
        let request = CompatibilityRequest {
            stbl: VesselParticulars {
                moulded_depth: Some(21.0),
                laden_draft: Some(14.8),
                ballast_draft: Some(7.4),
                ..VesselParticulars::default()
            },
            ..CompatibilityRequest::default()
        };

        let rendered = render_compatibility(&assess(&request));

        assert!(rendered.contains("- STBL: max 13.60, min 6.20, Cm -"));
        assert!(rendered.contains("- SS: max -, min -, Cm -"));
        assert!(rendered.contains("- minimum length: 21 m"));
        assert!(rendered.contains("- primary fender: -"));
        assert!(rendered.contains("- primary fenders required: -"));
    }

    #[test]
    fn revision_command_rejects_unparseable_labels() {
        assert!(run_revision(RevisionArgs {
            label: "1.4".to_string()
        })
        .is_ok());
        assert!(run_revision(RevisionArgs {
            label: "one".to_string()
        })
        .is_err());
    }
}
