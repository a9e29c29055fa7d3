#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Watching,
    /// Terminal; later batches are ignored.
    Found,
}

/// One-shot detector for the library's loader `<script>` tag.
///
/// Batches are fed in the order the observer delivers them; within a batch,
/// nodes must be flattened in mutation order then node order.
#[derive(Debug, Clone)]
pub struct ScriptWatcher {
    src_prefix: String,
    state: WatchState,
}

impl ScriptWatcher {
    pub fn new(src_prefix: impl Into<String>) -> Self {
        Self {
            src_prefix: src_prefix.into(),
            state: WatchState::Watching,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn is_loader_src(&self, src: &str) -> bool {
        src.starts_with(&self.src_prefix)
    }

    /// Scan one batch of added nodes. `script_src` yields the node's source URL
    /// when the node is a script element.
    ///
    /// Returns the first qualifying node and moves to [`WatchState::Found`].
    pub fn scan<N, I, F>(&mut self, nodes: I, script_src: F) -> Option<N>
    where
        I: IntoIterator<Item = N>,
        F: Fn(&N) -> Option<String>,
    {
        if self.state == WatchState::Found {
            return None;
        }
        let found = nodes.into_iter().find(|node| {
            script_src(node)
                .as_deref()
                .is_some_and(|src| self.is_loader_src(src))
        })?;
        self.state = WatchState::Found;
        Some(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "https://maps.googleapis.com/";

    #[derive(Debug, Clone, PartialEq)]
    enum Node {
        Script(&'static str),
        Div,
    }

    fn src(node: &Node) -> Option<String> {
        match node {
            Node::Script(src) => Some(src.to_string()),
            Node::Div => None,
        }
    }

    #[test]
    fn selects_the_single_loader_among_other_nodes() {
        let mut watcher = ScriptWatcher::new(PREFIX);
        let batch = vec![
            Node::Div,
            Node::Script("https://cdn.example.com/app.js"),
            Node::Script("https://maps.googleapis.com/maps/api/js?key=k"),
            Node::Div,
        ];
        let found = watcher.scan(batch, src);
        assert_eq!(
            found,
            Some(Node::Script("https://maps.googleapis.com/maps/api/js?key=k"))
        );
        assert_eq!(watcher.state(), WatchState::Found);
    }

    #[test]
    fn batch_without_loader_keeps_watching() {
        let mut watcher = ScriptWatcher::new(PREFIX);
        let batch = vec![Node::Div, Node::Script("/static/main.js")];
        assert_eq!(watcher.scan(batch, src), None);
        assert_eq!(watcher.state(), WatchState::Watching);
    }

    #[test]
    fn first_match_wins_and_later_batches_are_ignored() {
        let mut watcher = ScriptWatcher::new(PREFIX);
        let first = vec![
            Node::Script("https://maps.googleapis.com/first"),
            Node::Script("https://maps.googleapis.com/second"),
        ];
        assert_eq!(
            watcher.scan(first, src),
            Some(Node::Script("https://maps.googleapis.com/first"))
        );
        let again = vec![Node::Script("https://maps.googleapis.com/third")];
        assert_eq!(watcher.scan(again, src), None);
    }

    #[test]
    fn prefix_must_match_from_the_start() {
        let watcher = ScriptWatcher::new(PREFIX);
        assert!(!watcher.is_loader_src("https://evil.test/?u=https://maps.googleapis.com/"));
        assert!(!watcher.is_loader_src("http://maps.googleapis.com/maps/api/js"));
        assert!(watcher.is_loader_src("https://maps.googleapis.com/maps-api-v3/api/js"));
    }
}
