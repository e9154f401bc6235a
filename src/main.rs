use cities_webmap::config::MapConfig;
use cities_webmap::input::Inputs;
use cities_webmap::{diagnostics, render, stats, view};

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cities-webmap")]
#[command(about = "Static city population web map generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the HTML map from the data directory.
    Render {
        /// Directory holding the CSV and GeoJSON inputs [default: data]
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output HTML file [default: Webmap.html]
        #[arg(short = 'o', long)]
        out: Option<PathBuf>,

        /// YAML file overriding map settings.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the statistics the map is built from, without writing anything.
    Stats {
        /// Directory holding the CSV and GeoJSON inputs [default: data]
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// YAML file overriding map settings.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Render {
            data_dir,
            out,
            config,
        } => {
            let cfg = MapConfig::resolve(config.as_deref(), data_dir, out)?;

            // 1) Load inputs.
            let inputs = Inputs::load(&cfg.input_files())?;

            // 2) Build the map model.
            let data = view::build_map_data(&inputs, &cfg)?;

            // 3) Render HTML.
            let html = render::render_html(&data)?;
            render::write_report(&cfg.output, &html)?;
            eprintln!("Wrote {}", cfg.output.display());
        }
        Commands::Stats { data_dir, config } => {
            let cfg = MapConfig::resolve(config.as_deref(), data_dir, None)?;
            let inputs = Inputs::load(&cfg.input_files())?;
            let s = view::compute_stats(&inputs.cities, &inputs.states, &cfg.choropleth)?;

            diagnostics::note(format!(
                "{} cities, {} states",
                inputs.cities.len(),
                inputs.states.len()
            ));
            println!("center: {:.4}, {:.4}", s.center[0], s.center[1]);
            println!(
                "quartiles: min {} | lower {} | median {} | upper {}",
                stats::format_thousands(s.cuts.min),
                stats::format_thousands(s.cuts.lower),
                stats::format_thousands(s.cuts.median),
                stats::format_thousands(s.cuts.upper)
            );
            for (tier, count) in &s.tier_counts {
                println!("  {:<10} {}", tier.name(), count);
            }
            let thresholds: Vec<String> = s
                .thresholds
                .iter()
                .map(|t| stats::format_scale_value(*t))
                .collect();
            println!("thresholds: {}", thresholds.join(", "));
        }
    }

    Ok(())
}
