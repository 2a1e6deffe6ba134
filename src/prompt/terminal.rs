use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    app::AppContext,
    capture::{CaptureController, PromptEvent, PromptSink},
    library::{render_export, ExportOptions, Library, SaveKind},
    utils::{fs::write_atomic, preview},
};

use super::command::{PromptCommand, HELP};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

const LIST_PREVIEW_CHARS: usize = 80;

/// Prints capture events to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSink;

impl PromptSink for TerminalSink {
    fn emit(&self, event: PromptEvent) {
        println!("{}", describe_event(&event));
    }
}

pub fn describe_event(event: &PromptEvent) -> String {
    match event {
        PromptEvent::Pending(snapshot) => {
            let seconds = snapshot.remaining_ms.unwrap_or(0).div_ceil(1000);
            let mut line = format!(
                "\nCitation detected for '{}':\n  {}\n",
                snapshot.library, snapshot.preview
            );
            if snapshot.already_saved {
                line.push_str("  (already saved, a note will be appended)\n");
            }
            line.push_str(&format!(
                "Enter to save, :hold to write a longer note, or :skip. Saving in {seconds}s..."
            ));
            line
        }
        PromptEvent::Held { .. } => "Countdown stopped. Type a note and press Enter.".into(),
        PromptEvent::Saved {
            library,
            outcome,
            index,
            ..
        } => match outcome {
            SaveKind::Added => format!("Saved to '{library}' as #{}.", index + 1),
            SaveKind::NoteAppended => format!("Note added to #{} in '{library}'.", index + 1),
            SaveKind::AlreadyPresent => format!("Already in '{library}' as #{}.", index + 1),
        },
        PromptEvent::Discarded { .. } => "Citation skipped.".into(),
        PromptEvent::StorageFailed { library, message, .. } => format!(
            "Could not save to '{library}': {message}\nPress Enter to retry or :skip."
        ),
    }
}

pub fn render_library(library: &Library) -> String {
    if library.is_empty() {
        return format!("'{}' is empty.", library.name);
    }

    let mut out = format!("'{}' ({} citations)", library.name, library.len());
    for (position, record) in library.records.iter().enumerate() {
        out.push_str(&format!(
            "\n{:>3}. {}  {}",
            position + 1,
            record.created_at.format("%Y-%m-%d"),
            preview(&record.text, LIST_PREVIEW_CHARS)
        ));
        if let Some(pmid) = &record.pmid {
            out.push_str(&format!(" [PMID {pmid}]"));
        }
        if !record.note.is_empty() {
            out.push_str(" +note");
        }
    }
    out
}

/// Reads commands from stdin until EOF or Ctrl-C.
pub async fn run_terminal(ctx: &AppContext) -> Result<()> {
    println!(
        "Watching the clipboard. Active library: '{}' in {}. Type :help for commands.",
        ctx.capture.active_library(),
        ctx.data_dir.display()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("failed to read from stdin")? {
                    Some(line) => {
                        let defaults = ctx.settings.snapshot().export;
                        handle_command(&ctx.capture, PromptCommand::parse(&line, &defaults)).await;
                    }
                    None => {
                        log_info!("stdin closed, stopping prompt");
                        break;
                    }
                }
            }
            _ = &mut ctrl_c => {
                println!();
                log_info!("interrupted, stopping prompt");
                break;
            }
        }
    }
    Ok(())
}

async fn handle_command(capture: &CaptureController, command: PromptCommand) {
    match command {
        // Blank lines while idle are ignored; a stray note is not.
        PromptCommand::Save => {
            let _ = capture.on_commit(None).await;
        }
        PromptCommand::SaveWithNote(note) => {
            // Saved and StorageFailed already reach the terminal as events.
            if let Ok(None) = capture.on_commit(Some(note)).await {
                println!("Nothing pending, note ignored.");
            }
        }
        PromptCommand::Skip => {
            if !capture.discard().await {
                println!("Nothing pending.");
            }
        }
        PromptCommand::Hold => {
            if !capture.hold().await {
                println!("Nothing pending, or the countdown is already stopped.");
            }
        }
        PromptCommand::SwitchLibrary(name) => match capture.switch_library(&name) {
            Ok(name) => println!("Active library: '{name}'."),
            Err(err) => println!("{err}"),
        },
        PromptCommand::ListLibraries => match capture.libraries() {
            Ok(names) => {
                let active = capture.active_library();
                for name in names {
                    let marker = if name == active { '*' } else { ' ' };
                    println!("{marker} {name}");
                }
            }
            Err(err) => println!("{err}"),
        },
        PromptCommand::ListCitations => match capture.citations() {
            Ok(library) => println!("{}", render_library(&library)),
            Err(err) => println!("{err}"),
        },
        PromptCommand::Remove(number) => match capture.remove_citation(number - 1) {
            Ok(record) => println!("Removed: {}", preview(&record.text, LIST_PREVIEW_CHARS)),
            Err(err) => println!("{err}"),
        },
        PromptCommand::Clear => match capture.clear_library() {
            Ok(count) => println!("Removed {count} citations from '{}'.", capture.active_library()),
            Err(err) => println!("{err}"),
        },
        PromptCommand::Export { path, options } => match export_to(capture, &path, options) {
            Ok(count) => println!("Exported {count} citations to {}.", path.display()),
            Err(err) => {
                log_error!("export failed: {err:#}");
                println!("{err:#}");
            }
        },
        PromptCommand::Help => println!("{HELP}"),
        PromptCommand::Invalid(message) => println!("{message}"),
    }
}

fn export_to(capture: &CaptureController, path: &Path, options: ExportOptions) -> Result<usize> {
    let library = capture.citations()?;
    let text = render_export(&library, &options);
    write_atomic(path, text.as_bytes())
        .with_context(|| format!("failed to write export to {}", path.display()))?;
    Ok(library.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        capture::{CommitTrigger, PendingSnapshot},
        library::CitationRecord,
    };
    use chrono::{TimeZone, Utc};

    #[test]
    fn saved_event_uses_one_based_position() {
        let event = PromptEvent::Saved {
            cycle_id: "c1".into(),
            library: "refs".into(),
            trigger: CommitTrigger::Timeout,
            outcome: SaveKind::NoteAppended,
            index: 2,
            note: "a\n---\nb".into(),
        };
        assert_eq!(describe_event(&event), "Note added to #3 in 'refs'.");
    }

    #[test]
    fn pending_prompt_points_at_hold() {
        let event = PromptEvent::Pending(PendingSnapshot {
            cycle_id: "c1".into(),
            text: "Smith J. A study of things. Nature. 2020.".into(),
            preview: "Smith J. A study of things. Nature. 2020.".into(),
            note: String::new(),
            library: "refs".into(),
            already_saved: false,
            captured_at: Utc::now(),
            remaining_ms: Some(4_200),
        });
        let text = describe_event(&event);
        assert!(text.contains(":hold"));
        assert!(text.ends_with("Saving in 5s..."));
    }

    #[test]
    fn storage_failure_offers_retry() {
        let event = PromptEvent::StorageFailed {
            cycle_id: "c1".into(),
            library: "refs".into(),
            message: "disk full".into(),
        };
        let line = describe_event(&event);
        assert!(line.contains("disk full"));
        assert!(line.contains("retry"));
    }

    #[test]
    fn library_listing_marks_pmid_and_notes() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut library = Library::new("refs");
        library.records.push(CitationRecord::new(
            "Smith J. A study of things. Nature. 2020. PMID: 123.",
            "read later",
            now,
        ));
        library
            .records
            .push(CitationRecord::new("Doe A. Another title here. Cell. 2019.", "", now));

        let rendered = render_library(&library);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "'refs' (2 citations)");
        assert!(lines[1].starts_with("  1. 2024-03-01  Smith J."));
        assert!(lines[1].ends_with("[PMID 123] +note"));
        assert!(!lines[2].contains("+note"));
    }

    #[test]
    fn empty_library_listing() {
        assert_eq!(render_library(&Library::new("refs")), "'refs' is empty.");
    }
}
