//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_chart::{render_figure, render_heatmap};
use crate::domain::controller::{self, DashboardView, Selection, SelectionEvent};
use crate::domain::dataset::Dataset;
use crate::domain::error::DashboardError;
use crate::domain::observation::{Action, Side};
use crate::domain::panels::DisplayMode;
use crate::domain::schema::IndicatorGroup;
use crate::domain::settings::DashboardSettings;
use crate::domain::smoothing::SmoothingWindow;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "brokerdash", about = "Broker position dashboard for futures contracts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web dashboard
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Summarise the dataset: rows, brokers, years, contract order
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Compute the charts for one selection and write them as JSON
    Chart {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long = "broker", required = true)]
        brokers: Vec<String>,
        #[arg(long)]
        year: i32,
        #[arg(long = "side")]
        sides: Vec<Side>,
        #[arg(long = "action")]
        actions: Vec<Action>,
        #[arg(long)]
        contract: String,
        /// Smoothing window in days (1-30); defaults to the configured value
        #[arg(long)]
        window: Option<usize>,
        /// trend, holding or all; defaults to the configured value
        #[arg(long)]
        mode: Option<DisplayMode>,
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also render every chart as an SVG file into this directory
        #[arg(long)]
        svg_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::Info { config } => run_info(&config),
        Command::Chart {
            config,
            brokers,
            year,
            sides,
            actions,
            contract,
            window,
            mode,
            output,
            svg_dir,
        } => {
            let request = ChartRequest {
                brokers,
                year,
                sides,
                actions,
                contract,
                window,
                mode,
            };
            run_chart(&config, request, output.as_deref(), svg_dir.as_deref())
        }
    }
}

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn fail(err: DashboardError) -> ExitCode {
    tracing::error!("{err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, DashboardError> {
    FileConfigAdapter::from_file(path).map_err(|e| DashboardError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Settings with the data path resolved against the config file's directory.
pub fn load_settings(config_path: &Path) -> Result<DashboardSettings, DashboardError> {
    tracing::info!(path = %config_path.display(), "loading config");
    let config = load_config(config_path)?;
    let mut settings = DashboardSettings::from_config(&config)?;
    settings.data_path = resolve_data_path(config_path, &settings.data_path);
    Ok(settings)
}

pub fn resolve_data_path(config_path: &Path, data_path: &Path) -> PathBuf {
    if data_path.is_absolute() {
        return data_path.to_path_buf();
    }
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(data_path),
        _ => data_path.to_path_buf(),
    }
}

fn load_dataset(settings: &DashboardSettings) -> Result<(CsvAdapter, Dataset), DashboardError> {
    let adapter = CsvAdapter::new(settings.data_path.clone());
    let dataset = adapter.load_dataset(&settings.schema)?;
    Ok((adapter, dataset))
}

fn run_info(config_path: &Path) -> ExitCode {
    let (adapter, dataset) = match load_settings(config_path).and_then(|s| load_dataset(&s)) {
        Ok(loaded) => loaded,
        Err(e) => return fail(e),
    };

    let years: Vec<String> = dataset.years().iter().map(|y| y.to_string()).collect();
    println!("source:     {}", adapter.describe());
    println!("rows:       {}", dataset.len());
    println!("brokers:    {}", dataset.brokers().join(", "));
    println!("years:      {}", years.join(", "));
    println!("contracts:  {}", dataset.contract_order().join(", "));
    for group in IndicatorGroup::ALL {
        let columns = dataset.indicator_groups().columns(group);
        if !columns.is_empty() {
            println!("{:<11} {}", format!("{}:", group.key()), columns.join(", "));
        }
    }
    ExitCode::SUCCESS
}

/// Selection arguments of the `chart` command.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub brokers: Vec<String>,
    pub year: i32,
    pub sides: Vec<Side>,
    pub actions: Vec<Action>,
    pub contract: String,
    pub window: Option<usize>,
    pub mode: Option<DisplayMode>,
}

impl ChartRequest {
    pub fn selection(self, settings: &DashboardSettings) -> Result<Selection, DashboardError> {
        let window = match self.window {
            Some(days) => SmoothingWindow::new(days)?,
            None => settings.default_window,
        };
        Ok(Selection::default()
            .apply(SelectionEvent::Brokers(self.brokers))
            .apply(SelectionEvent::Year(Some(self.year)))
            .apply(SelectionEvent::Sides(self.sides))
            .apply(SelectionEvent::Actions(self.actions))
            .apply(SelectionEvent::Contract(Some(self.contract)))
            .apply(SelectionEvent::Window(window))
            .apply(SelectionEvent::Mode(self.mode.unwrap_or(settings.default_mode))))
    }
}

#[derive(Serialize)]
struct ChartOutput<'a> {
    selection: &'a Selection,
    view: &'a DashboardView,
}

fn run_chart(
    config_path: &Path,
    request: ChartRequest,
    output: Option<&Path>,
    svg_dir: Option<&Path>,
) -> ExitCode {
    match chart(config_path, request, output, svg_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn chart(
    config_path: &Path,
    request: ChartRequest,
    output: Option<&Path>,
    svg_dir: Option<&Path>,
) -> Result<(), DashboardError> {
    let settings = load_settings(config_path)?;
    let selection = request.selection(&settings)?;
    let (_, dataset) = load_dataset(&settings)?;

    let view = controller::render(&dataset, &selection);
    if view.is_empty() {
        tracing::warn!("no rows match the selection; writing empty charts");
    } else {
        tracing::info!(rows = view.row_count, "charts computed");
    }

    let json = serde_json::to_string_pretty(&ChartOutput {
        selection: &selection,
        view: &view,
    })
    .map_err(std::io::Error::other)?;

    match output {
        Some(path) => {
            fs::write(path, json)?;
            tracing::info!(path = %path.display(), "wrote chart JSON");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    if let Some(dir) = svg_dir {
        write_svgs(dir, &view)?;
    }
    Ok(())
}

/// One SVG per chart: the four overview charts, every indicator figure and
/// the correlation heatmap when present.
pub fn write_svgs(dir: &Path, view: &DashboardView) -> Result<Vec<PathBuf>, DashboardError> {
    fs::create_dir_all(dir)?;

    let mut files: Vec<(String, String)> = vec![
        ("holding.svg".into(), render_figure(&view.holding)),
        ("change_rate.svg".into(), render_figure(&view.change_rate)),
        ("price.svg".into(), render_figure(&view.price)),
        ("price_change.svg".into(), render_figure(&view.price_change)),
    ];
    for panel in &view.indicator_panels {
        for (idx, figure) in panel.figures.iter().enumerate() {
            let name = format!(
                "{}_{:02}_{}.svg",
                panel.group.key(),
                idx + 1,
                file_stem(&figure.title)
            );
            files.push((name, render_figure(figure)));
        }
    }
    if let Some(heatmap) = &view.correlation {
        files.push(("correlation.svg".into(), render_heatmap(heatmap)));
    }

    let mut written = Vec::with_capacity(files.len());
    for (name, svg) in files {
        let path = dir.join(name);
        fs::write(&path, svg)?;
        written.push(path);
    }
    tracing::info!(count = written.len(), dir = %dir.display(), "wrote SVG charts");
    Ok(written)
}

fn file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn run_serve(config_path: &Path) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::net::SocketAddr;
        use std::sync::Arc;

        let loaded = load_settings(config_path)
            .and_then(|s| load_dataset(&s).map(|(adapter, dataset)| (s, adapter, dataset)));
        let (settings, adapter, dataset) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => return fail(e),
        };

        let addr: SocketAddr = match settings.listen.parse() {
            Ok(addr) => addr,
            Err(e) => {
                return fail(DashboardError::ConfigInvalid {
                    section: "web".into(),
                    key: "listen".into(),
                    reason: format!("{e}"),
                });
            }
        };

        let state = AppState::new(dataset, Arc::new(adapter), settings);
        let router = build_router(state);

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => return fail(e.into()),
        };
        let served = runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(%addr, "dashboard listening");
            axum::serve(listener, router).await
        });

        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(e.into()),
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        tracing::error!("the web feature is required for serve");
        ExitCode::from(1)
    }
}
