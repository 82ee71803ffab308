use crabcapture::platform::{DiskEmitter, NativeBackend, SyntheticBackend};
use crabcapture::{CaptureBackend, CaptureWidget, CrabCaptureConfig};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const USAGE: &str = "Usage: crabcapture-cli <command> [args]

Commands:
  list-devices [--synthetic] [--json]
  record [device_id] [--seconds <n>] [--out <dir>] [--synthetic] [--json]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    crabcapture::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "list-devices" => cmd_list_devices(&args),
        "record" => cmd_record(&args).await,
        _ => {
            eprintln!("Unknown command: {}\n\n{}", command, USAGE);
            std::process::exit(1);
        }
    }
}

fn backend_for(
    args: &[String],
    config: &CrabCaptureConfig,
) -> (Box<dyn CaptureBackend>, Option<SyntheticBackend>) {
    if args.contains(&"--synthetic".to_string()) {
        let synthetic = SyntheticBackend::with_cameras(2);
        (Box::new(synthetic.clone()), Some(synthetic))
    } else {
        (Box::new(NativeBackend::from_config(config)), None)
    }
}

fn cmd_list_devices(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let config = CrabCaptureConfig::load_or_default();
    let (backend, _) = backend_for(args, &config);
    let emitter = DiskEmitter::new(&config.storage.output_directory);
    let mut widget = CaptureWidget::new(backend, Box::new(emitter), config);
    widget.initialize();

    let state = widget.state();
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&state.devices)?);
    } else if !state.permission_granted {
        println!("{}", widget.permission_info().message);
    } else {
        for d in &state.devices {
            let marker = if state.selected_device_id.as_deref() == Some(d.id.as_str()) {
                "*"
            } else {
                " "
            };
            println!("{} {}: {}", marker, d.id, d.label);
        }
    }
    Ok(())
}

async fn cmd_record(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    // Parse args: record [device_id] [--seconds <n>] [--out <dir>] [--synthetic] [--json]
    let mut device_id = None;
    let mut seconds: Option<u64> = None;
    let mut out_dir = None;
    let mut json = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--seconds" => {
                i += 1;
                seconds = Some(args.get(i).ok_or("--seconds needs a value")?.parse()?);
            }
            "--out" => {
                i += 1;
                out_dir = Some(args.get(i).ok_or("--out needs a value")?.clone());
            }
            "--json" => json = true,
            "--synthetic" => {}
            _ => {
                if device_id.is_none() {
                    device_id = Some(args[i].clone());
                }
            }
        }
        i += 1;
    }

    let mut config = CrabCaptureConfig::load_or_default();
    if let Some(dir) = out_dir {
        config.storage.output_directory = dir;
    }
    let (backend, synthetic) = backend_for(args, &config);
    let emitter = DiskEmitter::new(&config.storage.output_directory);
    let mut widget = CaptureWidget::new(backend, Box::new(emitter), config);

    widget.initialize();
    if let Some(id) = device_id {
        widget.select_device(&id);
    }

    let state = widget.state();
    if !state.permission_granted {
        return Err(widget.permission_info().message.into());
    }
    if let Some(error) = state.session_error {
        return Err(error.into());
    }
    {
        let session = widget.session()?;
        eprintln!(
            "Camera {} live (stream {})",
            session.device_id(),
            session.stream_id()
        );
    }

    if state.disclaimer_pending {
        eprintln!("{}", state.disclaimer_text);
        widget.accept_disclaimer();
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))?;
    }

    widget.start_recording()?;
    eprintln!("Recording... press Ctrl-C to stop");

    // Synthetic cameras have no encoder behind them; feed one chunk per tick
    let feeder = synthetic.and_then(|backend| backend.current_sink()).map(|sink| {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_millis(100));
            loop {
                tick.tick().await;
                sink.push_chunk_of_size(4096);
            }
        })
    });

    let mut last_reported = 0;
    while !interrupted.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
        widget.process_events();

        let elapsed = widget.recorder().elapsed_seconds();
        if elapsed != last_reported {
            eprintln!("  {}s", elapsed);
            last_reported = elapsed;
        }
        if seconds.is_some_and(|limit| elapsed >= limit) {
            break;
        }
    }

    if let Some(feeder) = feeder {
        feeder.abort();
    }
    widget.stop_recording()?;
    let file = widget.save_recording()?;
    widget.shutdown();

    if json {
        println!("{}", serde_json::to_string(&file)?);
    } else {
        println!(
            "Saved {} ({} bytes) to {}",
            file.filename,
            file.size,
            file.location.as_deref().unwrap_or("(unknown)")
        );
    }
    Ok(())
}
