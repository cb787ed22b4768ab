use std::time::{Duration, Instant};

use clap::Parser;
use spectral_gate::audio::{list_input_devices, list_output_devices, LiveMonitor};
use spectral_gate::config::{FftSize, ProcessorConfig};
use spectral_gate::spectrum::bin_to_hz;

/// Run the spectral gate live between the default input and output devices
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Gate threshold in dB against raw bin magnitude (-60 to 0)
    #[arg(long, default_value_t = -30.0, allow_hyphen_values = true)]
    cutoff_db: f32,
    /// Gain for bins below the threshold (0 = strong gate, 1 = weak gate)
    #[arg(long, default_value_t = 0.5)]
    balance: f32,
    /// Mix of processed signal (0 = dry, 1 = wet)
    #[arg(long, default_value_t = 1.0)]
    dry_wet: f32,
    /// FFT size: 64, 128, 256, 512, 1024 or 2048
    #[arg(long, default_value_t = 1024)]
    fft_size: usize,
    /// Stop after this many seconds (runs until interrupted when omitted)
    #[arg(long)]
    duration: Option<u64>,
    /// List audio devices and exit
    #[arg(long, default_value_t = false)]
    list_devices: bool,
}

const POLL_INTERVAL: Duration = Duration::from_millis(33);
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    if cli.list_devices {
        for device in list_input_devices()? {
            println!("in  {} ({} Hz, {} ch)", device.name, device.sample_rate, device.channels);
        }
        for device in list_output_devices()? {
            println!("out {} ({} Hz, {} ch)", device.name, device.sample_rate, device.channels);
        }
        return Ok(());
    }

    let config = ProcessorConfig {
        cutoff_db: cli.cutoff_db,
        balance: cli.balance,
        dry_wet: cli.dry_wet,
        fft_size: FftSize::try_from(cli.fft_size)?,
    };

    let mut monitor = LiveMonitor::new(config);
    let devices = monitor.start_with_devices()?;
    println!(
        "Monitoring {} -> {} (use headphones to avoid feedback)",
        devices.input.name, devices.output.name
    );

    let store = monitor.spectrum_store();
    let started = Instant::now();
    let mut last_report = started;
    let mut magnitudes = Vec::new();
    let mut gated = Vec::new();
    let mut last_frame = 0u64;

    loop {
        std::thread::sleep(POLL_INTERVAL);

        if let Some(seconds) = cli.duration {
            if started.elapsed() >= Duration::from_secs(seconds) {
                break;
            }
        }

        let frame_index = store.read_into(&mut magnitudes, &mut gated);
        if frame_index == last_frame || last_report.elapsed() < REPORT_INTERVAL {
            continue;
        }
        last_frame = frame_index;
        last_report = Instant::now();

        let passed = gated.iter().filter(|&&g| g).count();
        let (peak_bin, peak) = magnitudes
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0.0f32), |best, (k, m)| if m > best.1 { (k, m) } else { best });
        let peak_hz = bin_to_hz(peak_bin, store.fft_size(), devices.output.sample_rate as f64);

        log::info!(
            "frame {}: {}/{} bins open, peak {:.1} dB at {:.0} Hz",
            frame_index,
            passed,
            gated.len(),
            20.0 * peak.max(1e-9).log10(),
            peak_hz
        );
    }

    monitor.stop();
    Ok(())
}
