//! Command line surface: subcommands plus the interactive menu used when none is given.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Detect the lit color of a traffic signal in images, video files or a webcam"
)]
pub struct Args {
    /// Detection config as JSON. Missing fields keep their defaults.
    #[arg(long, global = true, env = "TRAFFIC_LIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the effective detection config as JSON and exit.
    #[arg(long)]
    pub print_config: bool,

    #[command(subcommand)]
    pub mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Mode {
    /// Process still images once.
    Image {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write `<stem>_detected.png` for every input into this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Write all reports as a JSON array.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Show each annotated image until a key is pressed.
        #[arg(long)]
        show: bool,
    },

    /// Process a video file frame by frame.
    Video {
        path: PathBuf,

        /// Re-encode the annotated frames (mp4v) to this file.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the run summary as JSON.
        #[arg(long)]
        json: Option<PathBuf>,

        #[arg(long)]
        no_display: bool,
    },

    /// Process a live camera until `q` or Ctrl-C.
    Webcam {
        #[arg(long, default_value_t = 0)]
        device: i32,

        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        no_display: bool,
    },
}

impl Mode {
    fn webcam() -> Self {
        Mode::Webcam {
            device: 0,
            output: None,
            no_display: false,
        }
    }
}

/// Ask for the input type on `out`, read answers from `input`.
pub fn prompt_mode<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Mode> {
    writeln!(out, "Choose input type:")?;
    writeln!(out, "1 = Webcam")?;
    writeln!(out, "2 = Video file")?;
    writeln!(out, "3 = Image file")?;
    let choice = ask(input, out, "Enter choice (1/2/3): ")?;

    let mode = match choice.as_str() {
        "1" => Mode::webcam(),
        "2" => Mode::Video {
            path: ask_path(input, out, "Enter video file path: ")?,
            output: None,
            json: None,
            no_display: false,
        },
        "3" => Mode::Image {
            paths: vec![ask_path(input, out, "Enter image file path: ")?],
            output_dir: None,
            json: None,
            show: true,
        },
        other => {
            log::warn!("invalid choice {:?}, defaulting to webcam", other);
            writeln!(out, "Invalid choice, defaulting to webcam...")?;
            Mode::webcam()
        }
    };

    Ok(mode)
}

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<String> {
    write!(out, "{}", prompt)?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn ask_path<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<PathBuf> {
    let answer = ask(input, out, prompt)?;
    if answer.is_empty() {
        bail!("no path given");
    }
    Ok(PathBuf::from(answer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt(answers: &str) -> Result<(Mode, String)> {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut out = Vec::new();
        let mode = prompt_mode(&mut input, &mut out)?;
        Ok((mode, String::from_utf8(out)?))
    }

    #[test]
    fn test_prompt_video() -> Result<()> {
        let (mode, shown) = prompt("2\nclips/junction.mp4\n")?;
        assert!(shown.contains("Enter video file path: "));
        assert_eq!(
            mode,
            Mode::Video {
                path: "clips/junction.mp4".into(),
                output: None,
                json: None,
                no_display: false,
            }
        );
        Ok(())
    }

    #[test]
    fn test_prompt_image_shows_result() -> Result<()> {
        let (mode, _) = prompt("3\n  signal.jpg \n")?;
        match mode {
            Mode::Image { paths, show, .. } => {
                assert_eq!(paths, vec![PathBuf::from("signal.jpg")]);
                assert!(show);
            }
            other => panic!("unexpected mode {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_prompt_invalid_defaults_to_webcam() -> Result<()> {
        let (mode, shown) = prompt("7\n")?;
        assert_eq!(mode, Mode::webcam());
        assert!(shown.contains("defaulting to webcam"));
        Ok(())
    }

    #[test]
    fn test_prompt_empty_path_fails() {
        assert!(prompt("3\n\n").is_err());
    }

    #[test]
    fn test_parse_subcommands() {
        let args = Args::try_parse_from([
            "traffic-light",
            "image",
            "a.png",
            "b.png",
            "--output-dir",
            "out",
        ])
        .unwrap();
        match args.mode {
            Some(Mode::Image { paths, output_dir, .. }) => {
                assert_eq!(paths.len(), 2);
                assert_eq!(output_dir, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected mode {:?}", other),
        }

        let args = Args::try_parse_from(["traffic-light", "webcam", "--device", "2"]).unwrap();
        assert!(matches!(args.mode, Some(Mode::Webcam { device: 2, .. })));

        assert!(Args::try_parse_from(["traffic-light", "image"]).is_err());
    }
}
