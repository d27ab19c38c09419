//! Delivery modes. Each one owns its input and output lifecycle and calls the
//! detector as a plain library function per frame.

use crate::cli::Mode;
use crate::source::{FrameReader, FrameSource};
use anyhow::{bail, Context, Result};
use opencv::{
    core::{Mat, Size},
    highgui,
    prelude::*,
    videoio::VideoWriter,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use traffic_light_core::SignalState;
use traffic_light_cv::traits::FrameProcessor;
use traffic_light_cv::utils::ImageUtils;
use traffic_light_cv::{FileReport, TrafficLightDetector};

const WINDOW_NAME: &str = "Traffic Light Detection";
const DEFAULT_FPS: f64 = 25.0;
const KEY_POLL_MS: i32 = 100;

/// Per-run tally of reported states. Each frame is counted on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamSummary {
    pub frames: u64,
    pub red: u64,
    pub yellow: u64,
    pub green: u64,
    pub unknown: u64,
    pub last_state: Option<SignalState>,
}

impl StreamSummary {
    pub fn record(&mut self, state: SignalState) {
        self.frames += 1;
        match state {
            SignalState::Red => self.red += 1,
            SignalState::Yellow => self.yellow += 1,
            SignalState::Green => self.green += 1,
            SignalState::Unknown => self.unknown += 1,
        }
        self.last_state = Some(state);
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    pub display: bool,
    pub output: Option<PathBuf>,
}

pub fn run(detector: &TrafficLightDetector, mode: Mode, stop: Arc<AtomicBool>) -> Result<()> {
    match mode {
        Mode::Image {
            paths,
            output_dir,
            json,
            show,
        } => run_images(
            detector,
            &paths,
            output_dir.as_deref(),
            json.as_deref(),
            show,
            &stop,
        ),
        Mode::Video {
            path,
            output,
            json,
            no_display,
        } => {
            let source = FrameSource::open_file(&path)?;
            let options = StreamOptions {
                display: !no_display,
                output,
            };
            let summary = run_stream(detector, source, &options, &stop)?;
            if let Some(json_path) = json {
                write_summary(&summary, &json_path)?;
            }
            Ok(())
        }
        Mode::Webcam {
            device,
            output,
            no_display,
        } => {
            let source = FrameSource::open_device(device)?;
            let options = StreamOptions {
                display: !no_display,
                output,
            };
            run_stream(detector, source, &options, &stop)?;
            Ok(())
        }
    }
}

/// One-shot processing of still images.
///
/// Files that fail to load are logged and skipped; outputs are still written
/// for the rest. Raising `stop` ends the batch after the current file.
pub fn run_images(
    detector: &TrafficLightDetector,
    paths: &[PathBuf],
    output_dir: Option<&Path>,
    json: Option<&Path>,
    show: bool,
    stop: &AtomicBool,
) -> Result<()> {
    if stop.load(Ordering::SeqCst) {
        log::info!("stop requested before processing {} images", paths.len());
        return Ok(());
    }

    let results = detector.detect_files(paths);

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    }

    let mut reports = Vec::new();
    for (path, result) in paths.iter().zip(results) {
        if stop.load(Ordering::SeqCst) {
            log::info!("stop requested after {} reports ({} inputs)", reports.len(), paths.len());
            break;
        }

        let detection = match result {
            Ok(detection) => detection,
            Err(err) => {
                log::warn!("skipping {:?}: {:#}", path, err);
                continue;
            }
        };
        println!("{}: {}", path.display(), detection.report.state);

        if let Some(dir) = output_dir {
            let target = dir.join(annotated_file_name(path));
            ImageUtils::save_image(&detection.annotated, &target)?;
            log::info!("annotated image saved: {:?}", target);
        }

        if show {
            highgui::imshow(WINDOW_NAME, &detection.annotated)?;
            wait_for_key(stop)?;
        }

        reports.push(FileReport {
            path: path.clone(),
            report: detection.report,
        });
    }

    if show {
        highgui::destroy_all_windows()?;
    }

    if let Some(json_path) = json {
        detector.export_json(&reports, json_path)?;
        log::info!("{} reports written: {:?}", reports.len(), json_path);
    }

    Ok(())
}

/// Block until a key is pressed in the preview window or `stop` is raised.
fn wait_for_key(stop: &AtomicBool) -> Result<()> {
    while !stop.load(Ordering::SeqCst) {
        if highgui::wait_key(KEY_POLL_MS)? >= 0 {
            break;
        }
    }
    Ok(())
}

/// Process frames in capture order until the source runs dry, `q` is
/// pressed in the preview window, or `stop` is raised.
pub fn run_stream<P, R>(
    processor: &P,
    mut source: R,
    options: &StreamOptions,
    stop: &AtomicBool,
) -> Result<StreamSummary>
where
    P: FrameProcessor,
    R: FrameReader,
{
    let mut summary = StreamSummary::default();
    let mut writer: Option<VideoWriter> = None;

    while !stop.load(Ordering::SeqCst) {
        let Some(mut frame) = source.next_frame()? else {
            break;
        };

        let report = processor.process(&mut frame)?;
        summary.record(report.state);

        if let Some(path) = &options.output {
            if writer.is_none() {
                writer = Some(open_writer(path, &frame, source.fps())?);
            }
            if let Some(writer) = writer.as_mut() {
                writer.write(&frame)?;
            }
        }

        if options.display {
            highgui::imshow(WINDOW_NAME, &frame)?;
            if highgui::wait_key(1)? & 0xFF == i32::from(b'q') {
                log::info!("stop requested from preview window");
                break;
            }
        }
    }

    if let Some(mut writer) = writer {
        writer.release()?;
    }
    if options.display {
        highgui::destroy_all_windows()?;
    }
    drop(source);

    log::info!(
        "processed {} frames: red={} yellow={} green={} unknown={}",
        summary.frames,
        summary.red,
        summary.yellow,
        summary.green,
        summary.unknown
    );
    Ok(summary)
}

fn open_writer(path: &Path, first_frame: &Mat, fps: Option<f64>) -> Result<VideoWriter> {
    let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
    let size = Size::new(first_frame.cols(), first_frame.rows());
    let writer = VideoWriter::new(
        &path.to_string_lossy(),
        fourcc,
        fps.unwrap_or(DEFAULT_FPS),
        size,
        true,
    )
    .with_context(|| format!("Failed to create video writer: {:?}", path))?;

    if !writer.is_opened()? {
        bail!("video writer for {:?} could not be opened", path);
    }
    log::info!("writing annotated video to {:?}", path);
    Ok(writer)
}

fn write_summary(summary: &StreamSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write JSON to: {:?}", path))
}

fn annotated_file_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    format!("{}_detected.png", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Point, Scalar, CV_8UC3};
    use opencv::imgproc;
    use std::collections::VecDeque;

    struct QueuedFrames(VecDeque<Mat>);

    impl FrameReader for QueuedFrames {
        fn next_frame(&mut self) -> Result<Option<Mat>> {
            Ok(self.0.pop_front())
        }
    }

    fn frame_with_lamp(bgr: Option<(f64, f64, f64)>) -> Result<Mat> {
        let mut frame = Mat::new_rows_cols_with_default(120, 160, CV_8UC3, Scalar::all(0.0))?;
        if let Some((b, g, r)) = bgr {
            imgproc::circle(
                &mut frame,
                Point::new(80, 70),
                15,
                Scalar::new(b, g, r, 0.0),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )?;
        }
        Ok(frame)
    }

    #[test]
    fn test_summary_record() {
        let mut summary = StreamSummary::default();
        summary.record(SignalState::Red);
        summary.record(SignalState::Red);
        summary.record(SignalState::Unknown);

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.red, 2);
        assert_eq!(summary.unknown, 1);
        assert_eq!(summary.last_state, Some(SignalState::Unknown));
    }

    #[test]
    fn test_stream_processes_in_order_until_exhausted() -> Result<()> {
        let frames = QueuedFrames(VecDeque::from(vec![
            frame_with_lamp(Some((0.0, 0.0, 255.0)))?,
            frame_with_lamp(Some((0.0, 255.0, 0.0)))?,
            frame_with_lamp(None)?,
        ]));

        let stop = AtomicBool::new(false);
        let summary = run_stream(
            &TrafficLightDetector::default(),
            frames,
            &StreamOptions::default(),
            &stop,
        )?;

        assert_eq!(summary.frames, 3);
        assert_eq!((summary.red, summary.green, summary.unknown), (1, 1, 1));
        assert_eq!(summary.last_state, Some(SignalState::Unknown));
        Ok(())
    }

    #[test]
    fn test_stream_honours_stop_flag() -> Result<()> {
        let frames = QueuedFrames(VecDeque::from(vec![frame_with_lamp(None)?]));
        let stop = AtomicBool::new(true);

        let summary = run_stream(
            &TrafficLightDetector::default(),
            frames,
            &StreamOptions::default(),
            &stop,
        )?;
        assert_eq!(summary.frames, 0);
        Ok(())
    }

    fn write_lamp_image(dir: &Path, name: &str, bgr: (f64, f64, f64)) -> Result<PathBuf> {
        let path = dir.join(name);
        ImageUtils::save_image(&frame_with_lamp(Some(bgr))?, &path)?;
        Ok(path)
    }

    #[test]
    fn test_run_images_writes_outputs() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = write_lamp_image(dir.path(), "junction.png", (0.0, 255.0, 255.0))?;

        let out_dir = dir.path().join("out");
        let json = dir.path().join("reports.json");
        run_images(
            &TrafficLightDetector::default(),
            &[input.clone()],
            Some(&out_dir),
            Some(&json),
            false,
            &AtomicBool::new(false),
        )?;

        assert!(out_dir.join("junction_detected.png").exists());
        let reports: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(json)?)?;
        assert_eq!(reports[0]["state"], "YELLOW");
        assert_eq!(reports[0]["path"], input.to_string_lossy().as_ref());
        Ok(())
    }

    #[test]
    fn test_run_images_skips_unreadable_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let red = write_lamp_image(dir.path(), "red.png", (0.0, 0.0, 255.0))?;
        let missing = dir.path().join("missing.png");
        let green = write_lamp_image(dir.path(), "green.png", (0.0, 255.0, 0.0))?;

        let out_dir = dir.path().join("out");
        let json = dir.path().join("reports.json");
        run_images(
            &TrafficLightDetector::default(),
            &[red.clone(), missing, green.clone()],
            Some(&out_dir),
            Some(&json),
            false,
            &AtomicBool::new(false),
        )?;

        assert!(out_dir.join("red_detected.png").exists());
        assert!(!out_dir.join("missing_detected.png").exists());
        assert!(out_dir.join("green_detected.png").exists());

        let reports: Vec<FileReport> = serde_json::from_str(&std::fs::read_to_string(json)?)?;
        let entries: Vec<_> = reports
            .iter()
            .map(|r| (r.path.clone(), r.report.state))
            .collect();
        assert_eq!(
            entries,
            vec![(red, SignalState::Red), (green, SignalState::Green)]
        );
        Ok(())
    }

    #[test]
    fn test_run_images_honours_stop_flag() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = write_lamp_image(dir.path(), "junction.png", (0.0, 0.0, 255.0))?;

        let out_dir = dir.path().join("out");
        let json = dir.path().join("reports.json");
        run_images(
            &TrafficLightDetector::default(),
            &[input],
            Some(&out_dir),
            Some(&json),
            true,
            &AtomicBool::new(true),
        )?;

        assert!(!out_dir.exists());
        assert!(!json.exists());
        Ok(())
    }

    #[test]
    fn test_annotated_file_name() {
        assert_eq!(annotated_file_name(Path::new("a/b/light.jpg")), "light_detected.png");
    }
}
