//! Command line signal generator
#![forbid(unsafe_code)]

mod hw;

use {
    clap::Parser,
    crossterm::{QueueableCommand, SynchronizedUpdate, cursor, terminal},
    dacwave::{
        GeneratorParams, Hz, RateMode, SampleBuffer, Streamer, TimerConfig, run_event_loop,
        timing::{DEFAULT_CLOCK_HZ, DEFAULT_SAMPLE_RATE, buffer_duration},
    },
    hw::{Keyboard, PacedTimer, StdoutDac, spawn_pacer},
    std::{
        io::{ErrorKind, IsTerminal, Write as _},
        ops::ControlFlow,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
    },
};

#[derive(clap::Parser)]
struct Args {
    /// Timer input clock in Hz
    #[arg(short = 'c', long, default_value_t = DEFAULT_CLOCK_HZ)]
    timer_clock: Hz,
    /// Sample rate used in fixed rate mode
    #[arg(short = 'r', long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: Hz,
    /// Start in fixed rate mode
    #[arg(long)]
    fixed: bool,
    /// Stop after this many buffer completions
    #[arg(short = 'n', long)]
    buffers: Option<u64>,
    /// Don't wait for buffers to drain in real time
    #[arg(long)]
    no_pace: bool,
    /// Disable visualization
    #[arg(long)]
    no_vis: bool,
}

/// Redraw at least this often even if nothing changed
const REDRAW_INTERVAL: u64 = 32;

fn main() -> std::io::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Off)
        .parse_default_env()
        .init();
    let args = Args::parse();
    let mut stderr = std::io::stderr().lock();
    let timer_cfg = TimerConfig {
        clock_hz: args.timer_clock,
        sample_rate: args.sample_rate,
    };
    let mut params = GeneratorParams::default();
    if args.fixed {
        params.toggle_rate_mode();
    }
    let mut streamer = match Streamer::new(params, timer_cfg) {
        Ok(streamer) => streamer,
        Err(e) => {
            writeln!(stderr, "Invalid configuration: {e}")?;
            return Err(std::io::Error::other("Configuration error"));
        }
    };
    if std::io::stdout().is_terminal() {
        writeln!(
            stderr,
            "You don't want to write sample data to a terminal. Trust me."
        )?;
        return Err(std::io::Error::other(
            "Attempting to write sample data to terminal",
        ));
    }
    let interactive = std::io::stdin().is_terminal();
    let vis = !args.no_vis && stderr.is_terminal();
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::Relaxed);
        })
        .map_err(std::io::Error::other)?;
    }
    if interactive {
        terminal::enable_raw_mode()?;
    }
    if vis {
        stderr.queue(terminal::EnterAlternateScreen)?;
        stderr.queue(terminal::DisableLineWrap)?;
        stderr.queue(cursor::Hide)?;
    }

    let mut keyboard = Keyboard::new(interactive, stop.clone());
    let (mut timer, reload) = PacedTimer::new();
    let mut dac = StdoutDac::new(stop.clone());
    streamer.start(&mut timer, &mut dac);
    log::info!(
        "Streaming {} Hz {}, reload {}",
        streamer.params().frequency,
        streamer.params().waveform.name(),
        timer.reload()
    );

    let (tx, rx) = crossbeam_channel::bounded(1);
    let pacer = spawn_pacer(tx, reload, timer_cfg.clock_hz, !args.no_pace);
    let mut draw_result = Ok(());
    let mut result = run_event_loop(
        &mut streamer,
        &rx,
        &mut keyboard,
        &mut timer,
        &mut dac,
        |streamer, outcome| {
            if stop.load(Ordering::Relaxed)
                || args.buffers.is_some_and(|n| streamer.completions >= n)
            {
                return ControlFlow::Break(());
            }
            let redraw = outcome.params_changed
                || streamer.completions == 1
                || streamer.completions % REDRAW_INTERVAL == 0;
            if vis && redraw {
                draw_result = stderr
                    .sync_update(|stderr| print(stderr, streamer))
                    .and_then(|r| r);
                if draw_result.is_err() {
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        },
    )
    .map_err(|e| {
        log::error!("{e}");
        std::io::Error::other(e)
    })
    .and(draw_result);
    if let Some(e) = dac.error.take()
        && e.kind() != ErrorKind::BrokenPipe
    {
        result = result.and(Err(e));
    }
    drop(rx);
    if pacer.join().is_err() {
        log::error!("Pacer thread panicked");
    }

    if vis {
        stderr.queue(terminal::LeaveAlternateScreen)?;
        stderr.queue(cursor::Show)?;
    }
    if interactive {
        terminal::disable_raw_mode()?;
    }
    stderr.flush()?;
    result
}

fn print(stderr: &mut std::io::StderrLock, streamer: &Streamer) -> std::io::Result<()> {
    let p = streamer.params();
    let cfg = streamer.timer_cfg();
    let reload = cfg.reload(p);
    stderr.queue(terminal::Clear(terminal::ClearType::All))?;
    stderr.queue(cursor::MoveTo(0, 0))?;
    // Raw mode needs explicit carriage returns
    write!(stderr, "= dacplay =\r\n\r\n")?;
    write!(stderr, "Waveform:  {}\r\n", p.waveform.name())?;
    write!(stderr, "Frequency: {} Hz\r\n", p.frequency)?;
    write!(stderr, "Amplitude: {}%\r\n", p.amplitude)?;
    write!(stderr, "Offset:    {}\r\n", p.offset)?;
    let mode = match p.rate_mode {
        RateMode::Variable => "variable".to_owned(),
        RateMode::Fixed => format!("fixed @ {} Hz", cfg.sample_rate),
    };
    write!(stderr, "Rate:      {mode}\r\n")?;
    write!(
        stderr,
        "Reload:    {} ({:.02} ms per buffer)\r\n",
        reload,
        buffer_duration(reload, cfg.clock_hz).as_secs_f64() * 1000.
    )?;
    write!(stderr, "Buffers:   {}\r\n\r\n", streamer.completions)?;
    // The buffer refilled by the latest completion
    let bufs = streamer.buffers();
    write!(stderr, "{}\r\n\r\n", scope(bufs.buffer(bufs.standby())))?;
    write!(
        stderr,
        "arrows: waveform/frequency  enter: fixed/variable  1-4: amplitude/offset  q: quit\r\n"
    )?;
    Ok(())
}

/// One line rendition of a buffer, one column per 4 samples
fn scope(buf: &SampleBuffer) -> String {
    const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    buf.chunks(4)
        .map(|chunk| LEVELS[usize::from(chunk[0]) * LEVELS.len() / 4096])
        .collect()
}
