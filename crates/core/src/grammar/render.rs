//! Renderer (C5): walks a parsed [`ast::Node`] tree into cleaned output text,
//! recording each node's `(res_start, res_end)` span as it goes.
//!
//! The walk is a single deterministic left-to-right pass. A `Command`
//! materializes its prototype's template (§4.2) against its bound argument
//! nodes; any bound argument the template never references (an arg a
//! `discard`-style command swallowed) is still walked so every node in the
//! tree ends up rendered, but contributes nothing to the output and collapses
//! to a zero-width span — the same treatment a `Blank` gets.

use detex_catalog::PrototypeToken;

use super::ast::{Node, NodeKind, ResSpan};
use crate::error::Result;
use crate::position::{Delta, Position};

/// Render `node` as if its first character began at `at`, recording `res` on
/// it and every descendant. Returns the rendered text this node produced.
pub fn render(node: &mut Node, at: Position) -> Result<String> {
    match &mut node.kind {
        NodeKind::PlainText(content) => {
            let end = at + Delta::from_source(content);
            node.res = Some(ResSpan { start: at, end });
            Ok(content.clone())
        }
        NodeKind::NewParagraph => {
            let text = "\n\n";
            let end = at + Delta::from_source(text);
            node.res = Some(ResSpan { start: at, end });
            Ok(text.to_string())
        }
        NodeKind::Blank => {
            node.res = Some(ResSpan { start: at, end: at });
            Ok(String::new())
        }
        NodeKind::Group(elems) => {
            let mut cur = at;
            let mut out = String::new();
            for elem in elems.iter_mut() {
                let piece = render(elem, cur)?;
                cur = elem.res.expect("render always sets res").end;
                out.push_str(&piece);
            }
            node.res = Some(ResSpan { start: at, end: cur });
            Ok(out)
        }
        NodeKind::Command {
            name,
            prototype,
            args,
        } => {
            let tokens = prototype.tokens(name)?;
            let mut referenced = vec![false; args.len()];
            let mut cur = at;
            let mut out = String::new();
            for tok in tokens {
                match tok {
                    PrototypeToken::Literal(text) => {
                        cur = cur + Delta::from_source(&text);
                        out.push_str(&text);
                    }
                    PrototypeToken::NameRef => {
                        cur = cur + Delta::from_source(name);
                        out.push_str(name);
                    }
                    PrototypeToken::ArgRef(i) => {
                        referenced[i] = true;
                        let piece = render(&mut args[i], cur)?;
                        cur = args[i].res.expect("render always sets res").end;
                        out.push_str(&piece);
                    }
                    PrototypeToken::LastArgRef => {
                        if let Some(i) = args.len().checked_sub(1) {
                            referenced[i] = true;
                            let piece = render(&mut args[i], cur)?;
                            cur = args[i].res.expect("render always sets res").end;
                            out.push_str(&piece);
                        }
                    }
                }
            }
            for (i, arg) in args.iter_mut().enumerate() {
                if !referenced[i] {
                    discard(arg, cur);
                }
            }
            node.res = Some(ResSpan { start: at, end: cur });
            Ok(out)
        }
        NodeKind::Root { elems, .. } => {
            let mut cur = at;
            let mut out = String::new();
            for elem in elems.iter_mut() {
                let piece = render(elem, cur)?;
                cur = elem.res.expect("render always sets res").end;
                out.push_str(&piece);
            }
            node.res = Some(ResSpan { start: at, end: cur });
            Ok(out)
        }
    }
}

/// Mark `node` and everything beneath it as rendered to a zero-width span at
/// `at`, contributing nothing to any output. Used for bound command
/// arguments a template never references.
fn discard(node: &mut Node, at: Position) {
    node.res = Some(ResSpan { start: at, end: at });
    match &mut node.kind {
        NodeKind::Group(elems) | NodeKind::Root { elems, .. } => {
            for e in elems {
                discard(e, at);
            }
        }
        NodeKind::Command { args, .. } => {
            for a in args {
                discard(a, at);
            }
        }
        NodeKind::PlainText(_) | NodeKind::NewParagraph | NodeKind::Blank => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::ORIGIN;
    use detex_catalog::CommandPrototype;

    #[test]
    fn plain_text_renders_verbatim() {
        let mut node = Node::plain_text("Hop", ORIGIN, ORIGIN + 3);
        let out = render(&mut node, ORIGIN).unwrap();
        assert_eq!(out, "Hop");
        assert_eq!(node.res.unwrap().end, ORIGIN + 3);
    }

    #[test]
    fn new_paragraph_renders_to_two_newlines() {
        let mut node = Node::new_paragraph(ORIGIN, ORIGIN + 5);
        let out = render(&mut node, ORIGIN).unwrap();
        assert_eq!(out, "\n\n");
    }

    #[test]
    fn group_concatenates_children() {
        let a = Node::plain_text("a", ORIGIN, ORIGIN + 1);
        let b = Node::plain_text("b", ORIGIN + 1, ORIGIN + 2);
        let mut group = Node::group(vec![a, b], ORIGIN, ORIGIN + 2);
        let out = render(&mut group, ORIGIN).unwrap();
        assert_eq!(out, "ab");
    }

    #[test]
    fn print_last_renders_only_its_last_argument() {
        let arg = Node::group(
            vec![Node::plain_text("Truc", ORIGIN, ORIGIN + 4)],
            ORIGIN,
            ORIGIN + 4,
        );
        let mut cmd = Node::command(
            "title",
            CommandPrototype::PrintLast,
            vec![arg],
            ORIGIN,
            ORIGIN + 4,
        );
        let out = render(&mut cmd, ORIGIN).unwrap();
        assert_eq!(out, "Truc");
    }

    #[test]
    fn discarded_args_contribute_nothing_but_are_rendered() {
        let say = Node::group(
            vec![Node::plain_text("say", ORIGIN, ORIGIN + 3)],
            ORIGIN,
            ORIGIN + 3,
        );
        let hello = Node::group(
            vec![Node::plain_text("hello", ORIGIN + 3, ORIGIN + 8)],
            ORIGIN + 3,
            ORIGIN + 8,
        );
        let mut cmd = Node::command(
            "discard1000",
            CommandPrototype::Generic {
                expected_narg: 1000,
                template: String::new(),
            },
            vec![say, hello],
            ORIGIN,
            ORIGIN + 8,
        );
        let out = render(&mut cmd, ORIGIN).unwrap();
        assert_eq!(out, "");
        let NodeKind::Command { args, .. } = &cmd.kind else {
            unreachable!()
        };
        for a in args {
            assert!(a.is_rendered());
            assert_eq!(a.res.unwrap().start, a.res.unwrap().end);
        }
    }
}
