use std::path::PathBuf;

use crate::library::{ExportOptions, ExportOrder};

/// One line typed at the terminal prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptCommand {
    /// Empty line: save the pending citation with whatever note is buffered.
    Save,
    SaveWithNote(String),
    Skip,
    Hold,
    SwitchLibrary(String),
    ListLibraries,
    ListCitations,
    /// 1-based, as shown by `:list`.
    Remove(usize),
    Clear,
    Export {
        path: PathBuf,
        options: ExportOptions,
    },
    Help,
    Invalid(String),
}

pub const HELP: &str = "\
  <enter>            save the pending citation
  <text>             save it with <text> as the note
  :skip              discard the pending citation
  :hold              stop the countdown to write a note
  :lib <name>        switch the active library
  :libs              list libraries
  :list              list citations in the active library
  :rm <n>            remove citation <n>
  :clear             remove every citation in the active library
  :export <path> [--by-time|--by-author] [--no-index] [--no-notes]
  :help              show this help";

impl PromptCommand {
    /// `defaults` seeds the options of `:export` before its flags apply.
    pub fn parse(line: &str, defaults: &ExportOptions) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return PromptCommand::Save;
        }
        let Some(rest) = line.strip_prefix(':') else {
            return PromptCommand::SaveWithNote(line.to_string());
        };

        let (word, args) = match rest.split_once(char::is_whitespace) {
            Some((word, args)) => (word, args.trim()),
            None => (rest, ""),
        };

        match word {
            "skip" | "discard" => PromptCommand::Skip,
            "hold" => PromptCommand::Hold,
            "libs" => PromptCommand::ListLibraries,
            "list" | "ls" => PromptCommand::ListCitations,
            "clear" => PromptCommand::Clear,
            "help" | "?" => PromptCommand::Help,
            "lib" if args.is_empty() => PromptCommand::Invalid("usage: :lib <name>".into()),
            "lib" => PromptCommand::SwitchLibrary(args.to_string()),
            "rm" => match args.parse::<usize>() {
                Ok(number) if number > 0 => PromptCommand::Remove(number),
                _ => PromptCommand::Invalid("usage: :rm <n> (n from :list)".into()),
            },
            "export" => parse_export(args, defaults),
            other => PromptCommand::Invalid(format!("unknown command ':{other}', try :help")),
        }
    }
}

fn parse_export(args: &str, defaults: &ExportOptions) -> PromptCommand {
    let mut options = defaults.clone();
    let mut path_parts = Vec::new();

    for token in args.split_whitespace() {
        match token {
            "--by-time" => options.order = ExportOrder::NewestFirst,
            "--by-author" => options.order = ExportOrder::Author,
            "--no-index" => options.include_index = false,
            "--no-notes" => options.include_notes = false,
            flag if flag.starts_with("--") => {
                return PromptCommand::Invalid(format!("unknown export flag {flag}"));
            }
            part => path_parts.push(part),
        }
    }

    if path_parts.is_empty() {
        return PromptCommand::Invalid("usage: :export <path> [flags]".into());
    }

    PromptCommand::Export {
        path: PathBuf::from(path_parts.join(" ")),
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> PromptCommand {
        PromptCommand::parse(line, &ExportOptions::default())
    }

    #[test]
    fn blank_line_saves_and_text_becomes_note() {
        assert_eq!(parse(""), PromptCommand::Save);
        assert_eq!(parse("   \t"), PromptCommand::Save);
        assert_eq!(
            parse("  key paper for ch. 2 "),
            PromptCommand::SaveWithNote("key paper for ch. 2".into())
        );
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse(":skip"), PromptCommand::Skip);
        assert_eq!(parse(":hold"), PromptCommand::Hold);
        assert_eq!(parse(":libs"), PromptCommand::ListLibraries);
        assert_eq!(parse(":list"), PromptCommand::ListCitations);
        assert_eq!(parse(":clear"), PromptCommand::Clear);
        assert_eq!(parse(":help"), PromptCommand::Help);
    }

    #[test]
    fn library_name_keeps_inner_spaces() {
        assert_eq!(
            parse(":lib  thesis refs "),
            PromptCommand::SwitchLibrary("thesis refs".into())
        );
        assert!(matches!(parse(":lib"), PromptCommand::Invalid(_)));
    }

    #[test]
    fn remove_takes_a_positive_number() {
        assert_eq!(parse(":rm 3"), PromptCommand::Remove(3));
        assert!(matches!(parse(":rm 0"), PromptCommand::Invalid(_)));
        assert!(matches!(parse(":rm two"), PromptCommand::Invalid(_)));
        assert!(matches!(parse(":rm"), PromptCommand::Invalid(_)));
    }

    #[test]
    fn export_flags_override_defaults() {
        let PromptCommand::Export { path, options } =
            parse(":export out/refs.txt --by-author --no-notes")
        else {
            panic!("expected export");
        };
        assert_eq!(path, PathBuf::from("out/refs.txt"));
        assert_eq!(options.order, ExportOrder::Author);
        assert!(options.include_index);
        assert!(!options.include_notes);

        let PromptCommand::Export { options, .. } = parse(":export refs.txt --by-time --no-index")
        else {
            panic!("expected export");
        };
        assert_eq!(options.order, ExportOrder::NewestFirst);
        assert!(!options.include_index);
    }

    #[test]
    fn export_requires_path_and_known_flags() {
        assert!(matches!(parse(":export"), PromptCommand::Invalid(_)));
        assert!(matches!(parse(":export --no-index"), PromptCommand::Invalid(_)));
        assert!(matches!(
            parse(":export refs.txt --sideways"),
            PromptCommand::Invalid(_)
        ));
    }

    #[test]
    fn unknown_command_is_reported() {
        match parse(":frobnicate now") {
            PromptCommand::Invalid(message) => assert!(message.contains(":frobnicate")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
