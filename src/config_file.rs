
use std::fmt::{Display, Formatter};
use std::path::Path;

use anyhow::{bail, Result};
use log::debug;

use crate::utils::text::{read_text, write_text};

const COMMENT_PREFIXES: [char; 3] = [';', '#', '/'];

/// `Key=Value` line.
///
/// A line that could not be split has an empty key; it is kept in place and
/// written back as an empty line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(key: &str, value: &str) -> Self {
        ConfigEntry { key: key.to_owned(), value: value.to_owned() }
    }

    pub fn malformed() -> Self {
        ConfigEntry::default()
    }

    /// Splits on the first `=`; the key is trimmed at its end, the value at its start.
    pub fn from_string(line: &str) -> Self {
        match line.find('=') {
            Some(index) if index > 0 => ConfigEntry {
                key: line[..index].trim_end().to_owned(),
                value: line[index + 1..].trim_start().to_owned(),
            },
            _ => ConfigEntry::malformed(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.key.is_empty()
    }

    pub fn as_string(&self) -> String {
        if self.key.is_empty() {
            String::new()
        } else {
            format!("{}={}", self.key, self.value)
        }
    }
}

/// One line of a section, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLine {
    /// Comment or blank line, kept verbatim.
    Comment(String),
    Entry(ConfigEntry),
}

impl ConfigLine {
    pub fn as_string(&self) -> String {
        match self {
            ConfigLine::Comment(text) => text.clone(),
            ConfigLine::Entry(entry) => entry.as_string(),
        }
    }

    pub fn entry(&self) -> Option<&ConfigEntry> {
        match self {
            ConfigLine::Comment(_) => None,
            ConfigLine::Entry(entry) => Some(entry),
        }
    }

    pub fn entry_mut(&mut self) -> Option<&mut ConfigEntry> {
        match self {
            ConfigLine::Comment(_) => None,
            ConfigLine::Entry(entry) => Some(entry),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSection {
    pub name: String,
    pub lines: Vec<ConfigLine>,
}

impl ConfigSection {
    pub fn new(name: &str) -> Self {
        ConfigSection { name: name.to_owned(), lines: vec![] }
    }

    pub fn entry_count(&self) -> usize {
        self.lines.iter().filter(|line| line.entry().is_some()).count()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.lines.iter().filter_map(ConfigLine::entry)
    }

    /// First entry whose key is exactly `key`.
    pub fn find_entry_mut(&mut self, key: &str) -> Option<&mut ConfigEntry> {
        self.lines.iter_mut()
            .filter_map(ConfigLine::entry_mut)
            .find(|entry| entry.key == key)
    }

    pub fn insert_front(&mut self, entry: ConfigEntry) {
        self.lines.insert(0, ConfigLine::Entry(entry));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveOptions {
    /// Sections holding only comments and blank lines are dropped when false.
    pub keep_comment_only_sections: bool,
}

/// An INI file: ordered sections, each an ordered list of entries and comments.
/// Lines before the first section header are not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    sections: Vec<ConfigSection>,
    line_ending: &'static str,
}

impl Default for ConfigFile {
    fn default() -> Self {
        ConfigFile { sections: vec![], line_ending: "\r\n" }
    }
}

impl ConfigFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and parses the file. A missing file gives an empty `ConfigFile`.
    pub fn load(path: &Path) -> Result<ConfigFile> {
        if !path.exists() {
            debug!("config file {:?} does not exist, starting empty", path);
            return Ok(ConfigFile::new());
        }
        let content = match read_text(path) {
            Ok(content) => content,
            Err(error) => bail!("Could not load config file {:?}\n -> {:?}", path, error),
        };
        Ok(ConfigFile::parse(&content))
    }

    pub fn parse(content: &str) -> ConfigFile {
        let mut config = ConfigFile {
            sections: vec![],
            line_ending: if content.contains("\r\n") { "\r\n" } else { "\n" },
        };
        let mut current: Option<usize> = None;
        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                if let Some(index) = current {
                    config.sections[index].lines.push(ConfigLine::Comment(String::new()));
                }
            } else if line.starts_with(COMMENT_PREFIXES) {
                if let Some(index) = current {
                    config.sections[index].lines.push(ConfigLine::Comment(line.to_owned()));
                }
            } else if current.is_some() && line.find('=').map(|pos| pos > 0).unwrap_or(false) {
                if let Some(index) = current {
                    config.sections[index].lines.push(ConfigLine::Entry(ConfigEntry::from_string(line)));
                }
            } else if is_section_header(line) {
                let name = line[1..line.len() - 1].trim();
                current = Some(config.section_index_or_create(name));
            } else if let Some(index) = current {
                debug!("config: malformed line {:?} in section {}", line, config.sections[index].name);
                config.sections[index].lines.push(ConfigLine::Entry(ConfigEntry::malformed()));
            }
        }
        config
    }

    fn section_index_or_create(&mut self, name: &str) -> usize {
        match self.sections.iter().position(|section| section.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(ConfigSection::new(name));
                self.sections.len() - 1
            }
        }
    }

    pub fn sections(&self) -> &[ConfigSection] {
        &self.sections
    }

    pub fn sections_mut(&mut self) -> &mut [ConfigSection] {
        &mut self.sections
    }

    pub fn section(&self, name: &str) -> Option<&ConfigSection> {
        self.sections.iter().find(|section| section.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut ConfigSection> {
        self.sections.iter_mut().find(|section| section.name == name)
    }

    pub fn add_section(&mut self, name: &str) -> &mut ConfigSection {
        let index = self.section_index_or_create(name);
        &mut self.sections[index]
    }

    pub fn remove_section(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|section| section.name != name);
        before != self.sections.len()
    }

    pub fn render(&self, options: &SaveOptions) -> String {
        let mut out = String::new();
        for section in &self.sections {
            if section.entry_count() == 0 && !options.keep_comment_only_sections {
                debug!("config: section [{}] has no entries, not written", section.name);
                continue;
            }
            out.push('[');
            out.push_str(&section.name);
            out.push(']');
            out.push_str(self.line_ending);
            for line in &section.lines {
                out.push_str(&line.as_string());
                out.push_str(self.line_ending);
            }
        }
        out
    }

    pub fn save(&self, path: &Path, options: &SaveOptions) -> Result<()> {
        write_text(path, &self.render(options))
    }
}

impl Display for ConfigFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&SaveOptions::default()))
    }
}

fn is_section_header(line: &str) -> bool {
    line.len() > 2 && line.starts_with('[') && line.ends_with(']')
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use indoc::indoc;

    use super::{ConfigEntry, ConfigFile, ConfigLine, SaveOptions};

    #[test]
    fn entry_from_string() {
        assert_eq!(ConfigEntry::from_string("Key = Value = 2"), ConfigEntry::new("Key", "Value = 2"));
        assert_eq!(ConfigEntry::from_string("+Paths=..\\Content"), ConfigEntry::new("+Paths", "..\\Content"));
        assert_eq!(ConfigEntry::from_string("Empty="), ConfigEntry::new("Empty", ""));
        assert!(ConfigEntry::from_string("=NoKey").is_malformed());
        assert!(ConfigEntry::from_string("NoEquals").is_malformed());
    }

    #[test]
    fn entry_as_string_reparses() {
        for line in ["Key=Value", "Empty=", "-Suppress=DevLoad", "A=B=C"] {
            let entry = ConfigEntry::from_string(line);
            assert_eq!(entry.as_string(), line);
            assert_eq!(ConfigEntry::from_string(&entry.as_string()), entry);
        }
        assert_eq!(ConfigEntry::malformed().as_string(), "");
    }

    #[test]
    fn parse_keeps_comments_and_blank_lines_in_order() {
        let config = ConfigFile::parse(indoc! {"
            ; preamble is dropped
            Orphan=1
            [ Engine.Engine ]
            ; the game class
            GameViewportClientClassName=UTGame.UTGameViewportClient

            # other style
            // and another
            bSmoothFrameRate=TRUE
        "});

        assert_eq!(config.sections().len(), 1);
        let section = config.section("Engine.Engine").unwrap();
        assert_eq!(section.lines, vec![
            ConfigLine::Comment("; the game class".to_string()),
            ConfigLine::Entry(ConfigEntry::new("GameViewportClientClassName", "UTGame.UTGameViewportClient")),
            ConfigLine::Comment("".to_string()),
            ConfigLine::Comment("# other style".to_string()),
            ConfigLine::Comment("// and another".to_string()),
            ConfigLine::Entry(ConfigEntry::new("bSmoothFrameRate", "TRUE")),
        ]);
    }

    #[test]
    fn repeated_header_appends_to_existing_section() {
        let config = ConfigFile::parse("[A]\nX=1\n[B]\nY=2\n[A]\nZ=3\n");
        assert_eq!(config.sections().len(), 2);
        let keys = config.section("A").unwrap().entries().map(|entry| entry.key.clone()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["X", "Z"]);
    }

    #[test]
    fn section_names_are_case_sensitive() {
        let config = ConfigFile::parse("[Core.System]\nA=1\n[core.system]\nB=2\n");
        assert_eq!(config.sections().len(), 2);
        assert!(config.section("CORE.SYSTEM").is_none());
    }

    #[test]
    fn malformed_line_is_written_as_empty_line() {
        let config = ConfigFile::parse("[A]\nX=1\ngarbage\nY=2\n");
        assert_eq!(config.to_string(), "[A]\nX=1\n\nY=2\n");
    }

    #[test]
    fn round_trip_well_formed_text() {
        let text = indoc! {"
            [URL]
            ; where the maps are
            Protocol=udk
            Map=UDKFrontEndMap.udk

            [Engine.ScriptPackages]
            +NonNativePackages=UTGame
            +NonNativePackages=UTGameContent
            -EditPackages=UTEditor
            Empty=
        "};
        let config = ConfigFile::parse(text);
        assert_eq!(config.render(&SaveOptions::default()), text);
    }

    #[test]
    fn round_trip_keeps_crlf() {
        let text = "[A]\r\nKey=Value\r\n\r\n[B]\r\n;c\r\nK=V\r\n";
        assert_eq!(ConfigFile::parse(text).render(&SaveOptions::default()), text);
    }

    #[test]
    fn comment_only_section_is_dropped_unless_asked() {
        let text = "[Docs]\n; only a comment\n\n[Real]\nKey=Value\n";
        let config = ConfigFile::parse(text);

        assert_eq!(config.render(&SaveOptions::default()), "[Real]\nKey=Value\n");
        assert_eq!(config.render(&SaveOptions { keep_comment_only_sections: true }), text);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let config = ConfigFile::load(Path::new("/does/not/exist/DefaultGame.ini")).unwrap();
        assert!(config.sections().is_empty());
    }

    #[test]
    fn load_fixture_and_save() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("resources/test/config/DefaultGame.ini");
        let config = ConfigFile::load(&path).unwrap();
        assert_eq!(config.sections().len(), 3);
        let game_info = config.section("Engine.GameInfo").unwrap();
        assert_eq!(game_info.entries().count(), 3);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("DefaultGame.ini");
        config.save(&out, &SaveOptions::default()).unwrap();
        // the comment-only [Docs] section is gone
        let saved = ConfigFile::load(&out).unwrap();
        assert_eq!(saved.sections().len(), 2);
        assert_eq!(saved.section("Engine.GameInfo"), config.section("Engine.GameInfo"));
    }

    #[test]
    fn section_edition() {
        let mut config = ConfigFile::parse("[A]\nK=1\n");
        config.add_section("B").insert_front(ConfigEntry::new("X", "2"));
        config.section_mut("A").unwrap().find_entry_mut("K").unwrap().value = "3".to_string();
        assert!(!config.remove_section("Missing"));
        assert_eq!(config.to_string(), "[A]\nK=3\n[B]\nX=2\n");
        assert!(config.remove_section("A"));
        assert_eq!(config.to_string(), "[B]\nX=2\n");
    }
}
