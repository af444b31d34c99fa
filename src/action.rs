//! Build command classification
//!
//! Each resolved build command is split into its executable and arguments
//! and mapped onto a closed set of action kinds. Anything else (cmake helper
//! invocations, shell no-ops, unknown tools) is skipped.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Kind of a timed build action
///
/// Serialized by variant name in the command cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    CompileC,
    CompileCpp,
    LinkC,
    LinkCpp,
}

impl ActionKind {
    pub fn is_compile(self) -> bool {
        matches!(self, ActionKind::CompileC | ActionKind::CompileCpp)
    }

    pub fn is_link(self) -> bool {
        !self.is_compile()
    }

    pub fn is_cpp(self) -> bool {
        matches!(self, ActionKind::CompileCpp | ActionKind::LinkCpp)
    }

    /// Human-readable label used in reports
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::CompileC => "Compile C",
            ActionKind::CompileCpp => "Compile C++",
            ActionKind::LinkC => "Link C",
            ActionKind::LinkCpp => "Link C++",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of classifying one build command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A compile or link action that gets timed
    Action(ActionKind),
    /// A known helper tool (cmake -E ...) that is skipped without comment
    Auxiliary,
    /// A compiler invocation that is neither a compile nor a link
    UnknownCompilerCommand,
    /// Anything else
    Unrecognized,
}

fn compiler_family() -> &'static Regex {
    static FAMILY: OnceLock<Regex> = OnceLock::new();
    FAMILY.get_or_init(|| Regex::new(r"gcc|clang|zapcc").expect("valid compiler family regex"))
}

/// Split a command line at the first space into (executable, arguments)
pub fn split_command(command: &str) -> Option<(&str, &str)> {
    command.split_once(' ')
}

fn executable_name(executable: &str) -> &str {
    executable
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(executable)
}

/// True if `executable` names a compiler from a known family
pub fn is_compiler(executable: &str) -> bool {
    compiler_family().is_match(executable_name(executable))
}

/// Classify a command line (guards already stripped)
pub fn classify(command: &str) -> Classification {
    let Some((executable, args)) = split_command(command) else {
        return Classification::Unrecognized;
    };

    if executable == ":" {
        return Classification::Unrecognized;
    }

    if executable.ends_with("cmake") {
        return Classification::Auxiliary;
    }

    if !is_compiler(executable) {
        return Classification::Unrecognized;
    }

    let cpp = executable.ends_with("++");
    let compile = args.split_whitespace().any(|t| t == "-c");
    let link = args.split_whitespace().any(|t| t.starts_with("-Wl,"));

    match (compile, link, cpp) {
        (true, _, false) => Classification::Action(ActionKind::CompileC),
        (true, _, true) => Classification::Action(ActionKind::CompileCpp),
        (false, true, false) => Classification::Action(ActionKind::LinkC),
        (false, true, true) => Classification::Action(ActionKind::LinkCpp),
        (false, false, _) => Classification::UnknownCompilerCommand,
    }
}

fn token_after<'a>(command: &'a str, flag: &str) -> Option<&'a str> {
    let mut tokens = command.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == flag {
            return tokens.next();
        }
    }
    None
}

/// Declared output path (`-o <path>`)
pub fn output_path(command: &str) -> Option<&str> {
    token_after(command, "-o")
}

/// Compiled source path (`-c <path>`)
pub fn source_path(command: &str) -> Option<&str> {
    token_after(command, "-c")
}

/// Where the instrumented compiler leaves the trace for a compile command
///
/// Same stem as the declared output, `json` extension, resolved against the
/// build directory.
pub fn trace_path(build_dir: &Path, command: &str) -> Option<PathBuf> {
    output_path(command).map(|out| build_dir.join(Path::new(out).with_extension("json")))
}

/// File a command is reported under: the output for links, the source for compiles
pub fn represented_file(kind: ActionKind, command: &str) -> Option<&str> {
    if kind.is_link() {
        output_path(command)
    } else {
        source_path(command)
    }
}
