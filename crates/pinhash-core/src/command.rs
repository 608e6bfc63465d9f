//! Shell command segmentation and package specifier parsing.
//!
//! A listing command such as `brew tap acme/tap && brew install --cask widget`
//! is split on top-level control operators into invocation segments. Each
//! segment is tokenized and, when it is an install invocation of a known
//! package manager, reduced to a [`PackageSpec`].

use std::fmt;

/// Package managers whose install commands can be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Manager {
    /// Homebrew formulae and casks.
    Homebrew,
    /// npm CLI.
    Npm,
    /// pnpm CLI.
    Pnpm,
    /// Yarn (classic and berry).
    Yarn,
    /// Bun's package manager.
    Bun,
    /// pip / pip3 / `python -m pip`.
    Pip,
    /// pipx application installer.
    Pipx,
    /// uv (`uv pip install`, `uv tool install`).
    Uv,
    /// `cargo install` / `cargo binstall`.
    Cargo,
}

impl Manager {
    /// Short lowercase name, as used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Manager::Homebrew => "brew",
            Manager::Npm => "npm",
            Manager::Pnpm => "pnpm",
            Manager::Yarn => "yarn",
            Manager::Bun => "bun",
            Manager::Pip => "pip",
            Manager::Pipx => "pipx",
            Manager::Uv => "uv",
            Manager::Cargo => "cargo",
        }
    }

    /// Managers that speak the npm registry protocol.
    pub fn uses_npm_registry(self) -> bool {
        matches!(
            self,
            Manager::Npm | Manager::Pnpm | Manager::Yarn | Manager::Bun
        )
    }

    /// Managers that install from the Python package index.
    pub fn uses_python_index(self) -> bool {
        matches!(self, Manager::Pip | Manager::Pipx | Manager::Uv)
    }
}

impl fmt::Display for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The install target extracted from one command segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Manager the segment invokes.
    pub manager: Manager,
    /// Package name as the registry knows it (may be scoped or tap-qualified).
    pub name: String,
    /// Explicit version, when the specifier pins one.
    pub version: Option<String>,
    /// Homebrew cask target (`--cask`, `brew cask install`).
    pub cask: bool,
}

impl PackageSpec {
    fn new(manager: Manager, name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            manager,
            name: name.into(),
            version,
            cask: false,
        }
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.manager, self.name)?;
        if self.cask {
            f.write_str(" (cask)")?;
        }
        if let Some(v) = &self.version {
            write!(f, "@{v}")?;
        }
        Ok(())
    }
}

/// Split a raw command into segments on top-level `&&`, `||`, `;`, `|`, `&`
/// and newlines. Operators inside quotes are not separators.
pub fn split_segments(command: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = command.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                } else if c == '\\' && q == '"' {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '\\' => {
                    // Line continuation joins the next line into this segment.
                    match chars.next() {
                        Some('\n') => current.push(' '),
                        Some(next) => {
                            current.push(c);
                            current.push(next);
                        }
                        None => current.push(c),
                    }
                }
                ';' | '\n' | '|' | '&' => {
                    if (c == '|' || c == '&') && chars.peek() == Some(&c) {
                        chars.next();
                    }
                    push_segment(&mut segments, &mut current);
                }
                _ => current.push(c),
            },
        }
    }
    push_segment(&mut segments, &mut current);
    segments
}

fn push_segment(segments: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
    current.clear();
}

/// Split a segment into shell words, removing quotes.
///
/// Unbalanced quoting falls back to plain whitespace splitting.
pub fn tokenize(segment: &str) -> Vec<String> {
    shlex::split(segment)
        .unwrap_or_else(|| segment.split_whitespace().map(ToString::to_string).collect())
}

/// Collapse runs of whitespace so cosmetic differences share a cache key.
pub fn normalize_command(command: &str) -> String {
    command.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse every segment of `command`, keeping segments that did not parse.
pub fn parse_command(command: &str) -> Vec<(String, Option<PackageSpec>)> {
    split_segments(command)
        .into_iter()
        .map(|segment| {
            let spec = parse_segment(&segment);
            (segment, spec)
        })
        .collect()
}

/// Parse one invocation segment into its install target.
///
/// Returns `None` for anything that is not a registry install of a known
/// manager: other subcommands, manifest installs, URLs, local paths and
/// VCS references.
pub fn parse_segment(segment: &str) -> Option<PackageSpec> {
    let tokens = tokenize(segment);
    let (program, args) = strip_wrappers(&tokens)?;

    match program {
        "brew" => parse_brew(args),
        "npm" => parse_node(Manager::Npm, args, &["install", "i", "in", "add"], NPM_VALUE_FLAGS),
        "pnpm" => parse_node(Manager::Pnpm, args, &["add", "install", "i"], PNPM_VALUE_FLAGS),
        "yarn" => parse_yarn(args),
        "bun" => parse_node(Manager::Bun, args, &["add", "install", "i", "a"], BUN_VALUE_FLAGS),
        "pip" | "pip3" => parse_pip(Manager::Pip, args, &["install"]),
        "pipx" => parse_pip(Manager::Pipx, args, &["install"]),
        "uv" => parse_uv(args),
        "cargo" => parse_cargo(args),
        python if is_python(python) => parse_python_module(args),
        _ => None,
    }
}

/// Drop `sudo`, `env`, `VAR=value` prefixes and return the program basename
/// with its arguments.
fn strip_wrappers(tokens: &[String]) -> Option<(&str, &[String])> {
    let mut rest = tokens;
    loop {
        let (first, tail) = rest.split_first()?;
        match first.as_str() {
            "sudo" => rest = skip_flags(tail, &["-u", "-g", "-C", "-D", "-h", "-p", "-U"]),
            "env" => rest = skip_flags(tail, &["-u", "-C", "-S"]),
            "command" | "exec" | "nohup" | "time" => rest = tail,
            word if is_assignment(word) => rest = tail,
            word => {
                let program = word.rsplit('/').next().unwrap_or(word);
                return Some((program, tail));
            }
        }
    }
}

fn skip_flags<'a>(tokens: &'a [String], value_flags: &[&str]) -> &'a [String] {
    let mut i = 0;
    while let Some(tok) = tokens.get(i) {
        if !tok.starts_with('-') {
            break;
        }
        i += if value_flags.contains(&tok.as_str()) { 2 } else { 1 };
    }
    tokens.get(i..).unwrap_or(&[])
}

fn is_assignment(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !name.starts_with(|c: char| c.is_ascii_digit())
        }
        None => false,
    }
}

fn is_python(program: &str) -> bool {
    program == "python"
        || program
            .strip_prefix("python")
            .is_some_and(|v| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit() || c == '.'))
}

/// One scanned command-line argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arg<'a> {
    Flag { name: &'a str, value: Option<&'a str> },
    Positional(&'a str),
}

/// Classify arguments, attaching values to flags listed in `value_flags`.
fn scan_args<'a>(args: &'a [String], value_flags: &[&str]) -> Vec<Arg<'a>> {
    let mut out = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    let mut flags_done = false;

    while let Some(arg) = iter.next() {
        let arg = arg.as_str();
        if flags_done || arg == "-" || !arg.starts_with('-') {
            out.push(Arg::Positional(arg));
            continue;
        }
        if arg == "--" {
            flags_done = true;
            continue;
        }
        if let Some((name, value)) = arg.split_once('=') {
            out.push(Arg::Flag {
                name,
                value: Some(value),
            });
        } else if value_flags.contains(&arg) {
            out.push(Arg::Flag {
                name: arg,
                value: iter.next().map(String::as_str),
            });
        } else {
            out.push(Arg::Flag {
                name: arg,
                value: None,
            });
        }
    }
    out
}

fn positionals<'a>(scanned: &[Arg<'a>]) -> Vec<&'a str> {
    scanned
        .iter()
        .filter_map(|a| match a {
            Arg::Positional(p) => Some(*p),
            Arg::Flag { .. } => None,
        })
        .collect()
}

fn has_flag(scanned: &[Arg<'_>], names: &[&str]) -> bool {
    scanned
        .iter()
        .any(|a| matches!(a, Arg::Flag { name, .. } if names.contains(name)))
}

fn flag_value<'a>(scanned: &[Arg<'a>], names: &[&str]) -> Option<&'a str> {
    scanned.iter().find_map(|a| match a {
        Arg::Flag { name, value } if names.contains(name) => *value,
        _ => None,
    })
}

/// URLs, paths, archives and VCS references never name a registry package.
pub fn looks_unresolvable(target: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "git+", "git@", "git:", "github:", "gitlab:", "bitbucket:", "gist:", "file:", "link:",
        "workspace:", "npm:", "./", "../", "/", "~", "$",
    ];
    const SUFFIXES: &[&str] = &[".tgz", ".tar.gz", ".tar", ".whl", ".zip", ".rb", ".git"];

    let lower = target.to_ascii_lowercase();
    target.is_empty()
        || target == "."
        || target == ".."
        || lower.contains("://")
        || PREFIXES.iter().any(|p| lower.starts_with(p))
        || SUFFIXES.iter().any(|s| lower.ends_with(s))
}

// --- Homebrew ---------------------------------------------------------------

fn parse_brew(args: &[String]) -> Option<PackageSpec> {
    let scanned = scan_args(args, &[]);
    let words = positionals(&scanned);

    let (legacy_cask, rest) = match words.split_first() {
        Some((&"cask", rest)) => (true, rest),
        _ => (false, words.as_slice()),
    };
    let (verb, rest) = rest.split_first()?;
    if !matches!(*verb, "install" | "reinstall" | "upgrade") {
        // `tap`, `info` and friends are recognized but install nothing.
        return None;
    }

    let target = *rest.first()?;
    if looks_unresolvable(target) {
        return None;
    }
    // Either a bare name or a fully tap-qualified `owner/tap/name`.
    let parts = target.split('/').count();
    if (parts != 1 && parts != 3) || target.split('/').any(str::is_empty) {
        return None;
    }

    let cask = legacy_cask
        || (has_flag(&scanned, &["--cask", "--casks"])
            && !has_flag(&scanned, &["--formula", "--formulae"]));

    Some(PackageSpec {
        cask,
        ..PackageSpec::new(Manager::Homebrew, target, None)
    })
}

// --- npm-compatible ---------------------------------------------------------

const NPM_VALUE_FLAGS: &[&str] = &[
    "--prefix",
    "--registry",
    "--tag",
    "--workspace",
    "-w",
    "--cache",
    "--userconfig",
    "--globalconfig",
    "--omit",
    "--include",
    "--loglevel",
    "--location",
    "--save-prefix",
    "--otp",
    "--cpu",
    "--os",
    "--libc",
    "--install-strategy",
    "--before",
    "--fetch-retries",
    "--fetch-timeout",
];
const PNPM_VALUE_FLAGS: &[&str] = &[
    "--filter",
    "-F",
    "--dir",
    "-C",
    "--registry",
    "--store-dir",
    "--reporter",
    "--loglevel",
    "--network-concurrency",
    "--child-concurrency",
    "--virtual-store-dir",
    "--modules-dir",
    "--global-dir",
];
const YARN_VALUE_FLAGS: &[&str] = &[
    "--cwd",
    "--registry",
    "--modules-folder",
    "--cache-folder",
    "--global-folder",
    "--network-concurrency",
    "--network-timeout",
    "--mutex",
    "--prefix",
];
const BUN_VALUE_FLAGS: &[&str] = &[
    "--cwd",
    "--registry",
    "--backend",
    "--cache-dir",
    "--config",
    "-c",
    "--network-concurrency",
    "--concurrent-scripts",
];

fn parse_node(
    manager: Manager,
    args: &[String],
    verbs: &[&str],
    value_flags: &[&str],
) -> Option<PackageSpec> {
    let scanned = scan_args(args, value_flags);
    let words = positionals(&scanned);
    let (verb, rest) = words.split_first()?;
    if !verbs.contains(verb) {
        return None;
    }
    node_spec(manager, rest.first()?)
}

fn parse_yarn(args: &[String]) -> Option<PackageSpec> {
    let scanned = scan_args(args, YARN_VALUE_FLAGS);
    let words = positionals(&scanned);
    let rest = match words.as_slice() {
        ["global", "add", rest @ ..] | ["add", rest @ ..] => rest,
        _ => return None,
    };
    node_spec(Manager::Yarn, rest.first()?)
}

/// Split an npm specifier into name and version.
///
/// For scoped names the version separator is the last `@` after the scope's
/// slash, so `@scope/pkg@1.2.0` yields `("@scope/pkg", "1.2.0")`.
pub fn split_npm_specifier(spec: &str) -> Option<(&str, Option<&str>)> {
    let (name, version) = if let Some(scoped) = spec.strip_prefix('@') {
        let slash = scoped.find('/')?;
        match scoped[slash..].rfind('@') {
            Some(at) => {
                let at = 1 + slash + at;
                (&spec[..at], Some(&spec[at + 1..]))
            }
            None => (spec, None),
        }
    } else {
        match spec.rfind('@') {
            Some(at) => (&spec[..at], Some(&spec[at + 1..])),
            None => (spec, None),
        }
    };

    let version = version.filter(|v| !v.is_empty());
    if name.is_empty() || name.ends_with('/') {
        return None;
    }
    Some((name, version))
}

fn node_spec(manager: Manager, target: &str) -> Option<PackageSpec> {
    if looks_unresolvable(target) {
        return None;
    }
    let (name, version) = split_npm_specifier(target)?;
    // `owner/repo` without a scope is GitHub shorthand, not a registry name.
    if !name.starts_with('@') && name.contains('/') {
        return None;
    }
    if name.starts_with('@') && name.matches('/').count() != 1 {
        return None;
    }
    Some(PackageSpec::new(manager, name, version.map(str::to_string)))
}

// --- Python -----------------------------------------------------------------

const PIP_VALUE_FLAGS: &[&str] = &[
    "-i",
    "--index-url",
    "--extra-index-url",
    "-f",
    "--find-links",
    "-t",
    "--target",
    "--prefix",
    "--root",
    "--python",
    "--python-version",
    "--platform",
    "--implementation",
    "--abi",
    "--trusted-host",
    "--src",
    "--upgrade-strategy",
    "--only-binary",
    "--no-binary",
    "--progress-bar",
    "--log",
    "--cache-dir",
    "--proxy",
    "--timeout",
    "--retries",
    "--cert",
    "--client-cert",
    "--exists-action",
    "-C",
    "--config-settings",
    "--with",
    "--from",
    "--suffix",
    "-r",
    "--requirement",
    "-c",
    "--constraint",
    "-e",
    "--editable",
];

/// Flags that point pip at a manifest or a local tree instead of a package.
const MANIFEST_FLAGS: &[&str] = &[
    "-r",
    "--requirement",
    "-c",
    "--constraint",
    "-e",
    "--editable",
];

fn parse_pip(manager: Manager, args: &[String], verbs: &[&str]) -> Option<PackageSpec> {
    let scanned = scan_args(args, PIP_VALUE_FLAGS);
    let words = positionals(&scanned);
    let (verb, rest) = words.split_first()?;
    if !verbs.contains(verb) {
        return None;
    }
    if has_flag(&scanned, MANIFEST_FLAGS) || has_manifest_shorthand(args) {
        return None;
    }
    python_spec(manager, rest.first()?)
}

fn parse_uv(args: &[String]) -> Option<PackageSpec> {
    let (sub, rest) = args.split_first()?;
    match sub.as_str() {
        "pip" | "tool" => parse_pip(Manager::Uv, rest, &["install"]),
        _ => None,
    }
}

fn parse_python_module(args: &[String]) -> Option<PackageSpec> {
    match args {
        [flag, module, rest @ ..] if flag == "-m" && module == "pip" => {
            parse_pip(Manager::Pip, rest, &["install"])
        }
        _ => None,
    }
}

/// `-rrequirements.txt` style short flags with the value glued on.
fn has_manifest_shorthand(args: &[String]) -> bool {
    args.iter().any(|a| {
        ["-r", "-c", "-e"]
            .iter()
            .any(|f| a.len() > 2 && a.starts_with(f) && !a.starts_with("--"))
    })
}

/// Split a PEP 508 requirement into name and `==` pin, dropping extras and
/// environment markers.
pub fn split_python_requirement(spec: &str) -> Option<(&str, Option<&str>)> {
    let spec = spec.split(';').next().unwrap_or(spec).trim();
    let name_end = spec
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(spec.len());
    let name = &spec[..name_end];
    if name.is_empty() {
        return None;
    }

    let mut rest = spec[name_end..].trim_start();
    if let Some(extras) = rest.strip_prefix('[') {
        let close = extras.find(']')?;
        rest = extras[close + 1..].trim_start();
    }
    // `name @ https://...` is a direct reference, not an index lookup.
    if rest.starts_with('@') {
        return None;
    }

    let pin = rest
        .strip_prefix("===")
        .or_else(|| rest.strip_prefix("=="))
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.contains(['*', ',', '<', '>', '!', '~']));
    Some((name, pin))
}

fn python_spec(manager: Manager, target: &str) -> Option<PackageSpec> {
    if looks_unresolvable(target) {
        return None;
    }
    let (name, version) = split_python_requirement(target)?;
    Some(PackageSpec::new(manager, name, version.map(str::to_string)))
}

// --- Cargo ------------------------------------------------------------------

const CARGO_VALUE_FLAGS: &[&str] = &[
    "--version",
    "--vers",
    "--git",
    "--path",
    "--branch",
    "--tag",
    "--rev",
    "--root",
    "--index",
    "--registry",
    "--features",
    "-F",
    "--bin",
    "--example",
    "--target",
    "--target-dir",
    "--profile",
    "-j",
    "--jobs",
    "--config",
    "-Z",
    "--color",
];

fn parse_cargo(args: &[String]) -> Option<PackageSpec> {
    // Skip a `+toolchain` override.
    let args = match args.split_first() {
        Some((first, rest)) if first.starts_with('+') => rest,
        _ => args,
    };
    let scanned = scan_args(args, CARGO_VALUE_FLAGS);
    let words = positionals(&scanned);
    let (verb, rest) = words.split_first()?;
    if !matches!(*verb, "install" | "binstall") {
        return None;
    }
    if has_flag(&scanned, &["--git", "--path", "--branch", "--tag", "--rev"]) {
        return None;
    }

    let target = *rest.first()?;
    if looks_unresolvable(target) {
        return None;
    }
    let (name, inline_version) = match target.split_once('@') {
        Some((name, version)) => (name, Some(version)),
        None => (target, None),
    };
    if name.is_empty() || name.contains('/') {
        return None;
    }

    let version = flag_value(&scanned, &["--version", "--vers"])
        .or(inline_version)
        .map(|v| v.trim_start_matches('=').to_string())
        .filter(|v| !v.is_empty());
    Some(PackageSpec::new(Manager::Cargo, name, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(segment: &str) -> Option<PackageSpec> {
        parse_segment(segment)
    }

    #[test]
    fn splits_on_control_operators() {
        let segments = split_segments("brew tap acme/tap && brew install widget; echo ok | cat");
        assert_eq!(
            segments,
            vec!["brew tap acme/tap", "brew install widget", "echo ok", "cat"]
        );
    }

    #[test]
    fn quoted_operators_do_not_split() {
        let segments = split_segments(r#"echo "a && b" || npm i -g x"#);
        assert_eq!(segments, vec![r#"echo "a && b""#, "npm i -g x"]);
    }

    #[test]
    fn line_continuations_are_joined() {
        let segments = split_segments("npm install \\\n  -g typescript");
        assert_eq!(segments.len(), 1);
        assert_eq!(
            spec(&segments[0]).map(|s| s.name),
            Some("typescript".to_string())
        );
    }

    #[test]
    fn tokenize_strips_quotes() {
        assert_eq!(
            tokenize(r#"pip install "requests[socks]==2.31.0" 'x y'"#),
            vec!["pip", "install", "requests[socks]==2.31.0", "x y"]
        );
    }

    #[test]
    fn tokenize_falls_back_on_unbalanced_quotes() {
        assert_eq!(
            tokenize("npm install 'left-pad"),
            vec!["npm", "install", "'left-pad"]
        );
    }

    #[test]
    fn brew_formula_and_cask() {
        let formula = spec("brew install --quiet jq").unwrap();
        assert_eq!(formula.manager, Manager::Homebrew);
        assert_eq!(formula.name, "jq");
        assert!(!formula.cask);

        let cask = spec("brew install --cask visual-studio-code").unwrap();
        assert!(cask.cask);

        let legacy = spec("brew cask install firefox").unwrap();
        assert!(legacy.cask);
        assert_eq!(legacy.name, "firefox");
    }

    #[test]
    fn brew_tap_qualified_and_versioned() {
        assert_eq!(spec("brew install acme/tap/widget").unwrap().name, "acme/tap/widget");
        let versioned = spec("brew install python@3.12").unwrap();
        assert_eq!(versioned.name, "python@3.12");
        assert_eq!(versioned.version, None);
        assert!(spec("brew install acme/widget").is_none());
        assert!(spec("brew tap acme/tap").is_none());
        assert!(spec("brew info jq").is_none());
    }

    #[test]
    fn npm_scoped_version_split() {
        let s = spec("npm install -g @anthropic-ai/cli@1.2.3").unwrap();
        assert_eq!(s.name, "@anthropic-ai/cli");
        assert_eq!(s.version.as_deref(), Some("1.2.3"));

        let bare = spec("npm i --save-dev @types/node").unwrap();
        assert_eq!(bare.name, "@types/node");
        assert_eq!(bare.version, None);
    }

    #[test]
    fn npm_value_flags_are_skipped() {
        let s = spec("npm --prefix /opt/tools install -g eslint@8").unwrap();
        assert_eq!(s.name, "eslint");
        assert_eq!(s.version.as_deref(), Some("8"));
    }

    #[test]
    fn value_flags_do_not_become_targets() {
        let s = spec("npm install --loglevel warn -g example-tool").unwrap();
        assert_eq!(s.name, "example-tool");
        assert_eq!(spec("npm i --location global --otp 123456 serve").unwrap().name, "serve");
        assert_eq!(spec("pnpm add --reporter silent -g tsx").unwrap().name, "tsx");
        assert_eq!(
            spec("yarn --network-concurrency 1 global add serve").unwrap().name,
            "serve"
        );
        assert_eq!(spec("bun add --concurrent-scripts 4 -g vercel").unwrap().name, "vercel");
    }

    #[test]
    fn node_managers() {
        assert_eq!(spec("pnpm add -g tsx").unwrap().manager, Manager::Pnpm);
        assert_eq!(spec("yarn global add serve").unwrap().name, "serve");
        assert_eq!(spec("bun add -g vercel").unwrap().manager, Manager::Bun);
        assert!(spec("yarn install").is_none());
        assert!(spec("npm run build").is_none());
    }

    #[test]
    fn rejects_urls_paths_and_vcs() {
        assert!(spec("npm install github:user/repo").is_none());
        assert!(spec("npm install user/repo").is_none());
        assert!(spec("npm install ./local-dir").is_none());
        assert!(spec("npm install https://example.com/x.tgz").is_none());
        assert!(spec("pip install git+https://github.com/a/b.git").is_none());
        assert!(spec("pip install .").is_none());
        assert!(spec("cargo install --git https://github.com/a/b").is_none());
        assert!(spec("brew install ./widget.rb").is_none());
    }

    #[test]
    fn pip_requirement_forms() {
        let s = spec("pip install 'requests[socks]==2.31.0'").unwrap();
        assert_eq!(s.name, "requests");
        assert_eq!(s.version.as_deref(), Some("2.31.0"));

        let ranged = spec("pip3 install --upgrade \"httpx>=0.27\"").unwrap();
        assert_eq!(ranged.name, "httpx");
        assert_eq!(ranged.version, None);

        let module = spec("python3 -m pip install --user black").unwrap();
        assert_eq!(module.manager, Manager::Pip);
        assert_eq!(module.name, "black");
    }

    #[test]
    fn pip_manifest_installs_are_refused() {
        assert!(spec("pip install -r requirements.txt").is_none());
        assert!(spec("pip install --requirement=requirements.txt").is_none());
        assert!(spec("pip install -rrequirements.txt").is_none());
        assert!(spec("pip install -e .").is_none());
    }

    #[test]
    fn pipx_and_uv() {
        assert_eq!(spec("pipx install ruff").unwrap().manager, Manager::Pipx);
        let uv = spec("uv tool install --python 3.12 ruff==0.5.0").unwrap();
        assert_eq!(uv.manager, Manager::Uv);
        assert_eq!(uv.name, "ruff");
        assert_eq!(uv.version.as_deref(), Some("0.5.0"));
        assert_eq!(spec("uv pip install httpie").unwrap().name, "httpie");
    }

    #[test]
    fn cargo_versions() {
        let flag = spec("cargo install ripgrep --version 14.1.0").unwrap();
        assert_eq!(flag.name, "ripgrep");
        assert_eq!(flag.version.as_deref(), Some("14.1.0"));

        let inline = spec("cargo +nightly install --locked bat@0.24.0").unwrap();
        assert_eq!(inline.name, "bat");
        assert_eq!(inline.version.as_deref(), Some("0.24.0"));

        let exact = spec("cargo install fd-find --vers =9.0.0").unwrap();
        assert_eq!(exact.version.as_deref(), Some("9.0.0"));

        assert!(spec("cargo build --release").is_none());
    }

    #[test]
    fn wrappers_are_stripped() {
        let s = spec("sudo -E NODE_ENV=production npm install -g pm2").unwrap();
        assert_eq!(s.manager, Manager::Npm);
        assert_eq!(s.name, "pm2");

        let env = spec("env HOMEBREW_NO_AUTO_UPDATE=1 brew install gh").unwrap();
        assert_eq!(env.name, "gh");

        assert_eq!(spec("/usr/local/bin/brew install jq").unwrap().name, "jq");
    }

    #[test]
    fn parse_command_keeps_segment_order() {
        let parsed = parse_command("brew tap acme/tap && brew install acme/tap/widget");
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].1.is_none());
        assert_eq!(parsed[1].1.as_ref().unwrap().name, "acme/tap/widget");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(
            normalize_command("  npm   install\t-g  x "),
            "npm install -g x"
        );
    }
}
