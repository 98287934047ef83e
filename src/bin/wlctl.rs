//! Send a single command to a window lights controller.

#[cfg(not(target_os = "espidf"))]
mod cli {
    use std::io::{self, Write};
    use std::net::TcpStream;

    use clap::{Args, Parser, Subcommand};
    use window_lights::config::DEFAULT_PORT;
    use window_lights::geometry::PIXEL_COUNT;
    use window_lights::pixel::Rgb;
    use window_lights::protocol::{Command, EncodeError};

    #[derive(Args, Debug)]
    struct ColorArguments {
        r: u8,
        g: u8,
        b: u8,
    }

    impl From<ColorArguments> for Rgb {
        fn from(c: ColorArguments) -> Self {
            Rgb::new(c.r, c.g, c.b)
        }
    }

    #[derive(Subcommand, Debug)]
    enum Commands {
        /// Switch display mode (0 sleep, 1 single frame, 2 once, 3 loop)
        Mode { mode: u8 },
        /// Set one pixel and show it
        Pixel {
            index: u8,
            #[command(flatten)]
            color: ColorArguments,
        },
        /// Set several pixels given as index:r,g,b and show them together
        Pixels {
            #[arg(value_parser = parse_pixel_item, required = true)]
            items: Vec<(u8, Rgb)>,
        },
        /// Store a single-colour frame in a slot
        FillFrame {
            slot: u8,
            delay_ms: u32,
            #[command(flatten)]
            color: ColorArguments,
        },
        /// Store a frame that lights a single pixel, leaving the rest black
        Frame {
            slot: u8,
            delay_ms: u32,
            index: usize,
            #[command(flatten)]
            color: ColorArguments,
        },
        /// Empty every frame slot
        Clear,
    }

    #[derive(Parser, Debug)]
    pub struct Arguments {
        /// Controller address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,

        #[clap(subcommand)]
        command: Commands,
    }

    #[derive(Debug, thiserror::Error)]
    pub enum ClientError {
        #[error(transparent)]
        Encode(#[from] EncodeError),
        #[error("failed to send command: {0}")]
        Io(#[from] io::Error),
    }

    fn parse_pixel_item(s: &str) -> Result<(u8, Rgb), String> {
        let (index, color) = s
            .split_once(':')
            .ok_or_else(|| format!("expected index:r,g,b, got '{s}'"))?;
        let index = index.parse().map_err(|e| format!("bad index '{index}': {e}"))?;
        let channels = color
            .split(',')
            .map(str::parse::<u8>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("bad colour '{color}': {e}"))?;
        match channels.as_slice() {
            &[r, g, b] => Ok((index, Rgb::new(r, g, b))),
            _ => Err(format!("expected three channels, got '{color}'")),
        }
    }

    fn build(command: Commands) -> Command {
        match command {
            Commands::Mode { mode } => Command::ChangeMode(mode),
            Commands::Pixel { index, color } => Command::SetPixel {
                index,
                color: color.into(),
            },
            Commands::Pixels { items } => Command::SetPixels(items),
            Commands::FillFrame {
                slot,
                delay_ms,
                color,
            } => Command::SetFrame {
                slot,
                delay_ms,
                pixels: vec![color.into(); PIXEL_COUNT],
            },
            Commands::Frame {
                slot,
                delay_ms,
                index,
                color,
            } => {
                let mut pixels = vec![Rgb::BLACK; PIXEL_COUNT];
                if let Some(p) = pixels.get_mut(index) {
                    *p = color.into();
                }
                Command::SetFrame {
                    slot,
                    delay_ms,
                    pixels,
                }
            }
            Commands::Clear => Command::ClearFrameBuffer,
        }
    }

    pub fn run(args: Arguments) -> Result<(), ClientError> {
        let bytes = build(args.command).encode()?;
        // The controller never replies, and closes after one command
        let mut stream = TcpStream::connect((args.host.as_str(), args.port))?;
        stream.write_all(&bytes)?;
        stream.flush()?;
        log::info!("sent {} bytes", bytes.len());
        Ok(())
    }

}

#[cfg(not(target_os = "espidf"))]
fn main() {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = cli::run(cli::Arguments::parse()) {
        eprintln!("wlctl: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_os = "espidf")]
fn main() {}
