//! FFmpeg subprocess handling: bind one planned book into an M4B.
//!
//! Source files go in through the concat demuxer, chapters through an
//! FFMETADATA side file, cover art as a second input mapped as an
//! attached picture. The output is written to a temp path and renamed
//! into place only after it verifies, so a crashed or cancelled run
//! never leaves a half-written book in the output directory.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use uuid::Uuid;

use crate::error::BindError;
use crate::planning::{BookPlan, Chapter, Strategy};

/// Convert one planned book. Returns the final output path.
pub async fn bind_book(
    plan: &BookPlan,
    output_dir: &Path,
    cancel: Arc<AtomicBool>,
) -> Result<PathBuf, BindError> {
    let workdir = output_dir.join(format!(".bind-{}", Uuid::new_v4()));
    fs::create_dir_all(&workdir).map_err(|e| BindError::Write {
        path: workdir.clone(),
        detail: e.to_string(),
    })?;

    let result = run_bind(plan, output_dir, &workdir, cancel).await;
    let _ = fs::remove_dir_all(&workdir);
    result
}

async fn run_bind(
    plan: &BookPlan,
    output_dir: &Path,
    workdir: &Path,
    cancel: Arc<AtomicBool>,
) -> Result<PathBuf, BindError> {
    let book_title = plan.display_title();

    let list_path = workdir.join("inputs.txt");
    write_side_file(&list_path, concat_list(plan))?;

    let chapters_path = workdir.join("chapters.txt");
    write_side_file(&chapters_path, ffmetadata(&plan.chapters))?;

    let cover_path = match &plan.cover {
        Some(cover) => {
            let path = workdir.join(format!("cover.{}", cover.file_ext));
            fs::write(&path, &cover.data).map_err(|e| BindError::Write {
                path: path.clone(),
                detail: e.to_string(),
            })?;
            Some(path)
        }
        None => None,
    };

    let temp_output = workdir.join("book.m4b");
    let args = build_args(plan, &list_path, &chapters_path, cover_path.as_deref(), &temp_output);

    log::debug!(
        "Binding \"{}\": {} files, {}",
        book_title,
        plan.book.file_count(),
        plan.decision.describe()
    );

    let child = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| BindError::Transcode {
            book: book_title.clone(),
            detail: format!("failed to spawn ffmpeg: {}", e),
        })?;

    // Dropping the wait future kills the child via kill_on_drop
    let output = tokio::select! {
        out = child.wait_with_output() => out.map_err(|e| BindError::Transcode {
            book: book_title.clone(),
            detail: format!("failed to wait for ffmpeg: {}", e),
        })?,
        _ = wait_for_cancel(cancel.clone()) => {
            return Err(BindError::Transcode {
                book: book_title,
                detail: "cancelled".to_string(),
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BindError::Transcode {
            book: book_title,
            detail: format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.lines().last().unwrap_or("Unknown error")
            ),
        });
    }

    // ffmpeg can exit 0 after writing nothing when inputs vanish
    let size = fs::metadata(&temp_output).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err(BindError::Transcode {
            book: book_title,
            detail: "ffmpeg produced an empty output file".to_string(),
        });
    }

    let final_path = next_free_path(output_dir, &plan.output_filename);
    fs::rename(&temp_output, &final_path).map_err(|e| BindError::Write {
        path: final_path.clone(),
        detail: e.to_string(),
    })?;

    Ok(final_path)
}

async fn wait_for_cancel(cancel: Arc<AtomicBool>) {
    loop {
        if cancel.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

fn write_side_file(path: &Path, contents: String) -> Result<(), BindError> {
    fs::write(path, contents).map_err(|e| BindError::Write {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Concat demuxer input list. Single quotes inside paths close the
/// quote, emit an escaped quote, and reopen.
fn concat_list(plan: &BookPlan) -> String {
    let mut list = String::new();
    for file in plan.book.files() {
        let escaped = file.path.to_string_lossy().replace('\'', "'\\''");
        list.push_str(&format!("file '{}'\n", escaped));
    }
    list
}

/// FFMETADATA chapter file with millisecond timebase.
fn ffmetadata(chapters: &[Chapter]) -> String {
    let mut out = String::from(";FFMETADATA1\n");
    for chapter in chapters {
        out.push_str("[CHAPTER]\n");
        out.push_str("TIMEBASE=1/1000\n");
        out.push_str(&format!("START={}\n", (chapter.start * 1000.0).round() as u64));
        out.push_str(&format!("END={}\n", (chapter.end * 1000.0).round() as u64));
        out.push_str(&format!("title={}\n", escape_metadata(&chapter.title)));
    }
    out
}

/// Escape FFMETADATA special characters in a value.
fn escape_metadata(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '=' | ';' | '#' | '\\' | '\n') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn build_args(
    plan: &BookPlan,
    list_path: &Path,
    chapters_path: &Path,
    cover_path: Option<&Path>,
    temp_output: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();

    args.extend(["-y", "-f", "concat", "-safe", "0", "-i"].map(OsString::from));
    args.push(list_path.into());
    if let Some(cover) = cover_path {
        args.push("-i".into());
        args.push(cover.into());
    }
    args.push("-i".into());
    args.push(chapters_path.into());

    args.extend(["-map", "0:a"].map(OsString::from));
    if cover_path.is_some() {
        args.extend(
            [
                "-map",
                "1:v:0",
                "-c:v:0",
                "png",
                "-disposition:v:0",
                "attached_pic",
                "-metadata:s:v:0",
                "title=Cover",
            ]
            .map(OsString::from),
        );
    }

    // The chapters file is always the last input
    let chapters_index = if cover_path.is_some() { 2 } else { 1 };
    args.push("-map_chapters".into());
    args.push(chapters_index.to_string().into());

    match plan.decision.strategy {
        Strategy::StreamCopy => {
            args.extend(["-c:a", "copy"].map(OsString::from));
        }
        Strategy::ReEncode => {
            args.extend(["-c:a", "aac", "-profile:a"].map(OsString::from));
            args.push(plan.decision.codec.ffmpeg_profile().into());
            args.push("-b:a".into());
            args.push(format!("{}k", plan.decision.bitrate).into());
            args.push("-ac".into());
            args.push(plan.decision.channels.to_string().into());
        }
    }

    let meta = &plan.metadata;
    let tag = |value: String| [OsString::from("-metadata"), OsString::from(value)];
    args.extend(tag(format!("title={}", meta.title)));
    args.extend(tag(format!("artist={}", meta.artist)));
    args.extend(tag(format!("album_artist={}", meta.artist)));
    args.extend(tag(format!("album={}", meta.title)));
    args.extend(tag(format!(
        "genre={}",
        meta.genre.as_deref().unwrap_or("Audiobook")
    )));
    if let Some(year) = &meta.year {
        args.extend(tag(format!("date={}", year)));
    }
    // stik = audiobook, so players shelve it correctly
    args.extend(tag("media_type=6".to_string()));

    args.extend(["-movflags", "+faststart", "-f", "mp4", "-brand", "M4B "].map(OsString::from));
    args.push(temp_output.into());

    args
}

/// First unused variant of `filename` in the output directory, adding
/// " (n)" before the extension on collisions.
fn next_free_path(output_dir: &Path, filename: &str) -> PathBuf {
    let candidate = output_dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    let stem = filename.strip_suffix(".m4b").unwrap_or(filename);
    let mut n = 1;
    loop {
        let candidate = output_dir.join(format!("{stem} ({n}).m4b"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
