use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scopegraph::acquisition::synthetic::{SyntheticSource, Tone};
use scopegraph::dsp::FrameProcessor;
use scopegraph::dsp::graph::{GraphGenerator, GraphSet};
use scopegraph::dsp::spectrum::{SpectrumConfig, SpectrumGenerator};
use scopegraph::dsp::trigger::SoftwareTrigger;
use scopegraph::settings::{DIVS_TIME, GraphFormat, ScopeSettings, TriggerMode};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Screens of data captured per frame so the trigger search has room on
/// either side of the displayed window.
const SCREENS_PER_FRAME: f64 = 2.0;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Auto,
    Normal,
    Single,
    Roll,
}

impl From<ModeArg> for TriggerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => TriggerMode::Auto,
            ModeArg::Normal => TriggerMode::Normal,
            ModeArg::Single => TriggerMode::Single,
            ModeArg::Roll => TriggerMode::Roll,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Ty,
    Xy,
}

impl From<FormatArg> for GraphFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Ty => GraphFormat::Ty,
            FormatArg::Xy => GraphFormat::Xy,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Scope settings file; defaults are used when it is missing or invalid.
    #[clap(long)]
    settings: Option<PathBuf>,

    /// Fail instead of falling back to defaults when the settings file
    /// cannot be read.
    #[clap(long, requires = "settings")]
    strict: bool,

    #[clap(long, default_value_t = 20)]
    frames: usize,

    #[clap(long, value_enum)]
    trigger_mode: Option<ModeArg>,

    #[clap(long, value_enum)]
    format: Option<FormatArg>,

    /// Compute and draw the spectrum of every channel.
    #[clap(long)]
    spectrum: bool,

    /// Replace every n-th frame with a flat, untriggered one.
    #[clap(long, default_value_t = 0)]
    dropout_every: u64,

    /// Write the last graph set as JSON.
    #[clap(long)]
    dump: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    debug!("[cli] {args:?}");

    let mut settings = load_settings(&args)?;
    apply_overrides(&args, &mut settings);

    let mut spectra = SpectrumGenerator::new(SpectrumConfig::default(), &settings);
    let mut graphs = GraphGenerator::with_trigger(settings.clone(), SoftwareTrigger);

    let mut source = synthetic_source(&settings).with_dropouts(args.dropout_every);
    let mut last: Option<GraphSet> = None;

    for index in 0..args.frames {
        let mut frame = source.next_frame();
        match spectra.process_frame(&frame) {
            Ok(spectrum) => frame.attach_spectra(spectrum),
            Err(err) => {
                error!("[spectrum] frame {index} dropped: {err}");
                continue;
            }
        }

        match graphs.process_frame(&frame) {
            Ok(set) => {
                info!(
                    "[graph] frame {index}: format={:?} triggered={} points={:?} spectrum={:?}",
                    set.format,
                    set.triggered,
                    set.voltage.iter().map(Vec::len).collect::<Vec<_>>(),
                    set.spectrum.iter().map(Vec::len).collect::<Vec<_>>(),
                );
                last = Some(set);
            }
            Err(err) => error!("[graph] frame {index} dropped: {err}"),
        }
    }

    info!("[graph] generator ready: {}", graphs.is_ready());

    if let Some(path) = args.dump.as_deref() {
        let set = last.unwrap_or_default();
        let json = serde_json::to_string_pretty(&set).context("serializing graph set")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing graph set to {}", path.display()))?;
        info!("[graph] wrote {}", path.display());
    }

    Ok(())
}

fn load_settings(args: &Cli) -> Result<ScopeSettings> {
    let Some(path) = args.settings.as_deref() else {
        return Ok(ScopeSettings::default());
    };
    if args.strict {
        ScopeSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))
    } else {
        Ok(ScopeSettings::load_or_default(path))
    }
}

fn apply_overrides(args: &Cli, settings: &mut ScopeSettings) {
    if let Some(mode) = args.trigger_mode {
        settings.trigger.mode = mode.into();
    }
    if let Some(format) = args.format {
        settings.horizontal.format = format.into();
    }
    settings.sanitize();
    if args.spectrum {
        for spectrum in &mut settings.spectrum {
            spectrum.used = true;
        }
    }
}

fn synthetic_source(settings: &ScopeSettings) -> SyntheticSource {
    let samplerate = settings.horizontal.samplerate;
    let screen = settings.horizontal.timebase * DIVS_TIME * samplerate;
    let record_length = (screen * SCREENS_PER_FRAME).round().max(2.0) as usize;

    // Neighbouring channels differ in frequency so XY pairs draw a figure.
    let tones = (0..settings.channel_count())
        .map(|channel| Tone {
            frequency: 500.0 * (channel + 1) as f64,
            amplitude: 1.0 / (1 + channel % 2) as f64,
            offset: 0.0,
        })
        .collect();

    SyntheticSource::new(tones, samplerate, record_length)
}
