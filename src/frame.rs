//! Turns the scope tree into the ordered lines of one frame.
//!
//! Frames carry no state of their own: rendering twice without tree changes
//! yields the same lines (apart from the spinner and running durations).

use crate::tree::Node;

/// Display lines for one render pass.
pub type Frame = Vec<String>;

/// Render every child of `root` in order. The root itself is never shown.
pub fn render_frame(root: &Node) -> Frame {
    let mut lines = Frame::new();
    for child in root.children() {
        child.render_into(0, &mut lines);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RendererConfig;
    use crate::style::ColorScheme;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn root() -> Arc<Node> {
        let config = RendererConfig::windows()
            .with_colors(ColorScheme::plain())
            .with_spinner(vec!["*".to_string()], Duration::from_secs(1));
        Node::root(Arc::new(config), Some(80))
    }

    fn titles(frame: &Frame) -> Vec<String> {
        frame
            .iter()
            .filter(|line| !line.starts_with(' '))
            .map(|line| line.split(' ').nth(1).unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn empty_tree_renders_nothing() {
        assert!(render_frame(&root()).is_empty());
    }

    #[test]
    fn root_is_not_rendered() {
        let root = root();
        root.find_or_create_child("a").start(0);
        root.find_or_create_child("b").start(0);
        let frame = render_frame(&root);
        assert_eq!(titles(&frame), vec!["a", "b"]);
        assert!(frame.iter().all(|line| !line.contains("root")));
    }

    #[test]
    fn one_title_line_per_node_in_first_seen_order() {
        let root = root();
        for name in ["c", "a", "b"] {
            let node = root.find_or_create_child(name);
            node.start(0);
            node.append_description("working\n");
        }
        root.find_or_create_child("a").append_description("more\n");
        root.find_or_create_child("c").finish(true);

        let frame = render_frame(&root);
        assert_eq!(titles(&frame), vec!["c", "a", "b"]);
        assert_eq!(frame.len(), 3 + 2 + 1);
    }

    #[test]
    fn rendering_concurrently_with_mutation_is_safe() {
        let root = root();
        let writer = {
            let root = Arc::clone(&root);
            thread::spawn(move || {
                for i in 0..200 {
                    let node = root.find_or_create_child(&format!("job {}", i % 7));
                    node.start(10);
                    node.append_description(&format!("step {i}\n"));
                    if let Some(bar) = node.progress() {
                        bar.add_progress(1);
                    }
                    if i % 5 == 0 {
                        node.find_or_create_child("sub").finish(i % 2 == 0);
                    }
                }
            })
        };
        for _ in 0..50 {
            let _ = render_frame(&root);
        }
        writer.join().unwrap();
        let frame = render_frame(&root);
        assert_eq!(
            frame.iter().filter(|l| l.starts_with('*')).count(),
            7,
            "{frame:#?}"
        );
    }
}
