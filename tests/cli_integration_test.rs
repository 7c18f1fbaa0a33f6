//! CLI integration tests for config loading and the `info` and `chart`
//! commands.
//!
//! Tests cover:
//! - Settings loading with the data path resolved next to the config file
//! - Config errors (missing file, missing data path, bad default window)
//! - `chart` writing JSON and SVG files for a real INI and CSV on disk
//! - `info` and failure exit codes

mod common;

use brokerdash::cli::{self, Cli};
use brokerdash::domain::controller::{SelectionEvent, render};
use brokerdash::domain::error::DashboardError;
use brokerdash::domain::panels::DisplayMode;
use brokerdash::domain::schema::IndicatorGroup;
use clap::Parser;
use common::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn exit_code_str(code: ExitCode) -> String {
    // ExitCode has no PartialEq; compare the Debug form.
    format!("{:?}", code)
}

fn fixture() -> Fixture {
    write_fixture(&positions_csv(), DASHBOARD_INI)
}

mod config_loading {
    use super::*;

    #[test]
    fn relative_data_path_resolves_next_to_config() {
        let fixture = fixture();
        let settings = cli::load_settings(&fixture.config).unwrap();

        assert_eq!(settings.data_path, fixture.data);
        assert_eq!(settings.default_window.get(), 7);
        assert_eq!(settings.default_mode, DisplayMode::All);
        assert_eq!(settings.listen, "127.0.0.1:0");
        assert_eq!(
            settings.schema.indicators.columns(IndicatorGroup::Trend),
            ["ma"]
        );
    }

    #[test]
    fn absolute_data_path_is_kept() {
        let resolved = cli::resolve_data_path(Path::new("/etc/dash.ini"), Path::new("/data/p.csv"));
        assert_eq!(resolved, PathBuf::from("/data/p.csv"));
    }

    #[test]
    fn bare_config_name_keeps_relative_path() {
        let resolved = cli::resolve_data_path(Path::new("dash.ini"), Path::new("p.csv"));
        assert_eq!(resolved, PathBuf::from("p.csv"));
    }

    #[test]
    fn missing_config_file_is_parse_error() {
        let err = cli::load_settings(Path::new("/nonexistent/dashboard.ini")).unwrap_err();
        assert!(matches!(err, DashboardError::ConfigParse { .. }));
    }

    #[test]
    fn missing_data_path_is_reported() {
        let fixture = write_fixture(&positions_csv(), "[dashboard]\ndefault_window = 3\n");
        let err = cli::load_settings(&fixture.config).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::ConfigMissing { ref section, ref key }
                if section == "data" && key == "path"
        ));
    }

    #[test]
    fn out_of_range_default_window_is_invalid() {
        let ini = DASHBOARD_INI.replace("default_window = 7", "default_window = 45");
        let fixture = write_fixture(&positions_csv(), &ini);
        let err = cli::load_settings(&fixture.config).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::ConfigInvalid { ref key, .. } if key == "default_window"
        ));
    }
}

mod chart_command {
    use super::*;

    #[test]
    fn chart_writes_json_for_selection() {
        let fixture = fixture();
        let out = fixture.dir.path().join("chart.json");

        let code = cli::run(Cli::parse_from([
            "brokerdash",
            "chart",
            "--config",
            fixture.config.to_str().unwrap(),
            "--broker",
            "Alpha",
            "--year",
            "2024",
            "--contract",
            "M2409",
            "--window",
            "2",
            "-o",
            out.to_str().unwrap(),
        ]));
        assert_eq!(exit_code_str(code), exit_code_str(ExitCode::SUCCESS));

        let json: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["view"]["row_count"], 3);
        assert_eq!(json["selection"]["window"], 2);
        assert_eq!(json["selection"]["contract"], "M2409");
    }

    #[test]
    fn chart_with_side_filter_and_svg_dir() {
        let fixture = fixture();
        let out = fixture.dir.path().join("chart.json");
        let svg_dir = fixture.dir.path().join("svg");

        let code = cli::run(Cli::parse_from([
            "brokerdash",
            "chart",
            "-c",
            fixture.config.to_str().unwrap(),
            "--broker",
            "Alpha",
            "--year",
            "2024",
            "--side",
            "long",
            "--contract",
            "M2409",
            "-o",
            out.to_str().unwrap(),
            "--svg-dir",
            svg_dir.to_str().unwrap(),
        ]));
        assert_eq!(exit_code_str(code), exit_code_str(ExitCode::SUCCESS));

        let json: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["view"]["row_count"], 2);
        assert!(svg_dir.join("holding.svg").exists());
        assert!(svg_dir.join("correlation.svg").exists());
    }

    #[test]
    fn chart_with_bad_window_fails() {
        let fixture = fixture();
        let code = cli::run(Cli::parse_from([
            "brokerdash",
            "chart",
            "-c",
            fixture.config.to_str().unwrap(),
            "--broker",
            "Alpha",
            "--year",
            "2024",
            "--contract",
            "M2409",
            "--window",
            "0",
        ]));
        assert_ne!(exit_code_str(code), exit_code_str(ExitCode::SUCCESS));
    }

    #[test]
    fn write_svgs_names_one_file_per_chart() {
        let fixture = fixture();
        let ds = dataset();
        let selection = brokerdash::domain::controller::Selection::default()
            .apply(SelectionEvent::Brokers(vec!["Alpha".into()]))
            .apply(SelectionEvent::Year(Some(2024)))
            .apply(SelectionEvent::Contract(Some("M2409".into())));
        let view = render(&ds, &selection);

        let dir = fixture.dir.path().join("charts");
        let written = cli::write_svgs(&dir, &view).unwrap();

        // 4 overview charts, ma and cci indicator charts, heatmap
        assert_eq!(written.len(), 7);
        for path in &written {
            let svg = std::fs::read_to_string(path).unwrap();
            assert!(svg.starts_with("<svg"));
        }
        assert!(written.iter().any(|p| p.ends_with("price_change.svg")));
    }

    #[test]
    fn write_svgs_for_empty_view_writes_placeholders() {
        let fixture = fixture();
        let view = brokerdash::domain::controller::DashboardView::empty();
        let written = cli::write_svgs(fixture.dir.path(), &view).unwrap();

        assert_eq!(written.len(), 4);
        let svg = std::fs::read_to_string(&written[0]).unwrap();
        assert!(svg.contains("No data for the current selection"));
    }
}

mod info_command {
    use super::*;

    #[test]
    fn info_succeeds_for_valid_fixture() {
        let fixture = fixture();
        let code = cli::run(Cli::parse_from([
            "brokerdash",
            "info",
            "-c",
            fixture.config.to_str().unwrap(),
        ]));
        assert_eq!(exit_code_str(code), exit_code_str(ExitCode::SUCCESS));
    }

    #[test]
    fn info_fails_for_missing_config() {
        let code = cli::run(Cli::parse_from([
            "brokerdash",
            "info",
            "-c",
            "/nonexistent/dashboard.ini",
        ]));
        assert_ne!(exit_code_str(code), exit_code_str(ExitCode::SUCCESS));
    }

    #[test]
    fn info_fails_when_data_file_missing() {
        let fixture = fixture();
        std::fs::remove_file(&fixture.data).unwrap();
        let code = cli::run(Cli::parse_from([
            "brokerdash",
            "info",
            "-c",
            fixture.config.to_str().unwrap(),
        ]));
        assert_ne!(exit_code_str(code), exit_code_str(ExitCode::SUCCESS));
    }
}
