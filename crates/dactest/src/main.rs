//! Testing utilities for dacwave

use {
    anstyle::AnsiColor,
    clap::Parser,
    dacwave::{BUFFER_SIZE, GeneratorParams, RateMode, TimerConfig, Waveform, fill_buffer},
    std::{
        error::Error,
        io::{self},
        path::PathBuf,
    },
};

#[derive(clap::Parser)]
enum Args {
    /// Write all waveform tables, in index order, as raw bytes
    DumpTables { out_path: PathBuf },
    /// Compare the waveform tables against a known good dump
    CompareTables,
    /// Write one rendered buffer per waveform as little endian u16 samples
    DumpBuffers {
        out_path: PathBuf,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Compare rendered buffers against a known good dump
    CompareBuffers {
        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Frequency in Hz
    #[arg(short, long, default_value_t = GeneratorParams::DEFAULT_FREQ)]
    frequency: u16,
    /// Amplitude in percent
    #[arg(short, long, default_value_t = 50)]
    amplitude: i16,
    /// Offset, 50 being centered
    #[arg(short, long, default_value_t = 50)]
    offset: i16,
    /// Render in fixed rate mode
    #[arg(long)]
    fixed: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    if let Err(e) = std::fs::create_dir_all(basedir()) {
        eprintln!("Error: Failed to create test dir: {e}");
    }
    match args {
        Args::DumpTables { out_path } => std::fs::write(out_path, dump_tables_buf())?,
        Args::CompareTables => compare("clean-tables.bin", &dump_tables_buf())?,
        Args::DumpBuffers { out_path, render } => dump_buffers_file(out_path, &render)?,
        Args::CompareBuffers { render } => {
            compare(&buffers_file_name(&render), &dump_buffers_buf(&render)?)?;
        }
    }
    Ok(())
}

fn dump_tables_buf() -> Vec<u8> {
    let mut out = Vec::with_capacity(Waveform::ALL.len() * BUFFER_SIZE);
    for wf in Waveform::ALL {
        out.extend_from_slice(wf.table());
    }
    out
}

fn dump_buffers_buf(render: &RenderArgs) -> Result<Vec<u8>, Box<dyn Error>> {
    let timer_cfg = TimerConfig::default();
    let mut params = GeneratorParams {
        frequency: render.frequency,
        amplitude: render.amplitude,
        offset: render.offset,
        rate_mode: if render.fixed {
            RateMode::Fixed
        } else {
            RateMode::Variable
        },
        ..Default::default()
    };
    if !params.is_valid() {
        return Err(format!("Parameters out of range: {params:?}").into());
    }
    let mut samples = Vec::with_capacity(Waveform::ALL.len() * BUFFER_SIZE);
    let mut buf = [0; BUFFER_SIZE];
    for wf in Waveform::ALL {
        params.waveform = wf;
        fill_buffer(&params, timer_cfg.sample_rate, &mut buf);
        samples.extend_from_slice(&buf);
    }
    Ok(bytemuck::cast_slice(samples.as_slice()).to_vec())
}

fn dump_buffers_file(out_path: PathBuf, render: &RenderArgs) -> Result<(), Box<dyn Error>> {
    std::fs::write(out_path, dump_buffers_buf(render)?)?;
    Ok(())
}

fn buffers_file_name(render: &RenderArgs) -> String {
    let mode = if render.fixed { "fixed" } else { "var" };
    format!(
        "clean-buffers-{}hz-a{}-o{}-{mode}.bin",
        render.frequency, render.amplitude, render.offset
    )
}

fn basedir() -> PathBuf {
    std::env::temp_dir().join("dacwave-test")
}

fn compare(clean_name: &str, dirty: &[u8]) -> io::Result<()> {
    let path = basedir().join(clean_name);
    if !path.exists() {
        return Err(io::Error::other(format!(
            "Need clean file at '{}'",
            path.display()
        )));
    }
    let clean = std::fs::read(path)?;
    if clean == dirty {
        pass(&format!("{clean_name} matches"));
    } else {
        match clean.iter().zip(dirty).position(|(a, b)| a != b) {
            Some(pos) => fail(&format!("{clean_name}: first mismatch at byte {pos}")),
            None => fail(&format!(
                "{clean_name}: length mismatch ({} vs {})",
                clean.len(),
                dirty.len()
            )),
        }
    }
    Ok(())
}

fn pass(msg: &str) {
    let style = anstyle::Style::new()
        .fg_color(Some(anstyle::Color::Ansi(AnsiColor::Green)))
        .bold();
    eprintln!("{style}[PASS]{style:#} {msg}");
}

fn fail(msg: &str) {
    let style = anstyle::Style::new()
        .fg_color(Some(anstyle::Color::Ansi(AnsiColor::Red)))
        .bold();
    eprintln!("{style}[FAIL]{style:#} {msg}");
}
