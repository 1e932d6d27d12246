//! Node table shared by the sysfs backends
//!
//! Resolves channel nodes under a path prefix once at construction, performs
//! newline-terminated text writes and keeps a short history of the traffic
//! for diagnostics.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{error, warn};

use super::{unsupported, Channel, RegisterValue};

/// Number of operations kept for `debug`
pub const RECORDS_SIZE: usize = 32;

#[derive(Debug, Clone)]
struct Node {
    name: String,
    path: PathBuf,
    present: bool,
}

#[derive(Debug, Clone)]
struct Record {
    op: &'static str,
    node: String,
    value: String,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' = '{}'", self.op, self.node, self.value)
    }
}

/// Channel to node mapping rooted at a path prefix
#[derive(Debug)]
pub struct SysfsNodes {
    prefix: PathBuf,
    nodes: BTreeMap<Channel, Node>,
    debug_paths: Vec<PathBuf>,
    records: VecDeque<Record>,
}

impl SysfsNodes {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        let prefix = prefix.into();
        if prefix.as_os_str().is_empty() {
            warn!("No driver path prefix given, resolving nodes from the working directory");
        }
        Self {
            prefix,
            nodes: BTreeMap::new(),
            debug_paths: Vec::new(),
            records: VecDeque::with_capacity(RECORDS_SIZE),
        }
    }

    /// Map a channel to a node. Relative names are joined to the prefix,
    /// absolute names are used as given.
    pub fn open(&mut self, channel: Channel, name: &str) {
        let path = self.prefix.join(name);
        let present = path.exists();
        if !present {
            error!("Failed to open {}: no such node", path.display());
        }
        self.nodes.insert(
            channel,
            Node {
                name: name.to_string(),
                path,
                present,
            },
        );
    }

    /// Extra nodes dumped verbatim by `debug`
    pub fn set_debug_paths(&mut self, paths: Vec<PathBuf>) {
        self.debug_paths = paths;
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn has(&self, channel: Channel) -> bool {
        self.nodes.get(&channel).is_some_and(|node| node.present)
    }

    pub fn set(&mut self, channel: Channel, value: &RegisterValue) -> io::Result<()> {
        let node = self.node(channel)?.clone();
        let result = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&node.path)
            .and_then(|mut file| writeln!(file, "{}", value));
        if let Err(e) = &result {
            error!("Failed to write {}: {}", node.name, e);
        }
        self.record("set", &node.name, value.to_string());
        result
    }

    pub fn get(&mut self, channel: Channel) -> io::Result<RegisterValue> {
        let node = self.node(channel)?.clone();
        match fs::read_to_string(&node.path) {
            Ok(raw) => {
                let value = RegisterValue::parse(&raw);
                self.record("get", &node.name, value.to_string());
                Ok(value)
            }
            Err(e) => {
                error!("Failed to read {}: {}", node.name, e);
                self.record("get", &node.name, String::new());
                Err(e)
            }
        }
    }

    fn node(&self, channel: Channel) -> io::Result<&Node> {
        self.nodes
            .get(&channel)
            .filter(|node| node.present)
            .ok_or_else(|| unsupported(channel))
    }

    fn record(&mut self, op: &'static str, node: &str, value: String) {
        if self.records.len() == RECORDS_SIZE {
            self.records.pop_front();
        }
        self.records.push_back(Record {
            op,
            node: node.to_string(),
            value,
        });
    }

    /// Most recent operations, oldest first
    pub fn records(&self) -> impl Iterator<Item = String> + '_ {
        self.records.iter().map(Record::to_string)
    }

    pub fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "Kernel:")?;
        for path in &self.debug_paths {
            writeln!(out, "  {}:", path.display())?;
            if let Ok(contents) = fs::read_to_string(self.prefix.join(path)) {
                for line in contents.lines() {
                    writeln!(out, "    {}", line)?;
                }
            }
        }
        writeln!(out, "  Nodes:")?;
        for (channel, node) in &self.nodes {
            let state = if node.present { "" } else { " (missing)" };
            writeln!(out, "    {}: {}{}", channel, node.name, state)?;
        }
        writeln!(out, "  Records:")?;
        for record in &self.records {
            writeln!(out, "    {}", record)?;
        }
        Ok(())
    }
}
