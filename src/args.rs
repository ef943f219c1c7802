use crate::error::{Error, Result};

pub const USAGE: &str = "
Simple app to save https://manganelo.com manga to pdf file. Arguments:
    -m=M, --manga=M - part of the manga URL. Can be taken from url https://manganelo.com/manga/M (default: tales_of_demons_and_gods)
    -c=N, --chapters=N - save only N first chapters. If value is negative last N chapters will be saved
";

const CHAPTER_FLAGS: [&str; 2] = ["--chapters=", "-c="];
const MANGA_FLAGS: [&str; 2] = ["--manga=", "-m="];

/// Options accepted on the command line. Both are optional; the
/// downloader supplies defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// Positive: first N chapters. Negative: last N chapters. Zero or absent: all.
    pub chapter_limit: Option<i64>,
    pub manga_id: Option<String>,
}

/// Parses raw arguments, program name excluded.
///
/// Each argument is checked against the chapter form, then the manga form,
/// then the help test; the first that matches wins and anything else is
/// ignored. Any argument containing `help` aborts with
/// [`Error::HelpRequested`] without looking at later arguments.
pub fn parse_args<I, S>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions::default();

    for arg in args {
        let arg = arg.as_ref();

        if let Some(value) = strip_any(arg, &CHAPTER_FLAGS) {
            let limit = value
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::InvalidArgument(format!("{} value is not a number", arg)))?;
            options.chapter_limit = Some(limit);
        } else if let Some(value) = strip_any(arg, &MANGA_FLAGS) {
            if value.is_empty() {
                return Err(Error::InvalidArgument(format!("{} has empty url part", arg)));
            }
            options.manga_id = Some(value.to_string());
        } else if arg.contains("help") {
            return Err(Error::HelpRequested);
        }
    }

    Ok(options)
}

fn strip_any<'a>(arg: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| arg.strip_prefix(prefix))
}
