//! 解析器端到端测试：不变量、容错与幂等

mod common;
use common::{parse_source, registry, tokens, SAMPLE_PROGRAM};
use quill_core::{
    parse, Argument, BlockKind, CollectingSink, OperandShape, Parser, ParserConfig, RejectReason,
    SentenceMode, Severity,
};

#[test]
fn test_empty_input() {
    for source in ["", "\n\n", "   \n\t\n"] {
        let stream = tokens(source);
        assert!(stream.tokens.is_empty());

        let parsed = parse(&stream.tokens, &registry()).unwrap();
        assert!(parsed.tree.children(parsed.tree.root()).is_empty());
        assert!(parsed.diagnostics.is_empty());
    }
}

#[test]
fn test_sample_program_tree_shape() {
    let parsed = parse_source(SAMPLE_PROGRAM).unwrap();
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

    let leads: Vec<Option<&str>> = parsed
        .tree
        .sentences()
        .iter()
        .filter(|n| n.mode != SentenceMode::Literal)
        .map(|n| n.lead.as_deref())
        .collect();
    assert_eq!(
        leads,
        vec![
            Some("let"),
            Some("let"),
            Some("let"),
            Some("define"),
            Some("speak"),
            Some("return"),
            Some("while"),
            Some("if"),
            Some("speak"),
            Some("else"),
            Some("speak"),
            Some("bless"),
            Some("store"),
            Some("let"),
            Some("walk"),
        ]
    );
}

#[test]
fn test_tree_invariants() {
    let parsed = parse_source(SAMPLE_PROGRAM).unwrap();
    let tree = &parsed.tree;

    for (id, node) in tree.iter() {
        let children = tree.children(id);
        if !children.is_empty() {
            assert_eq!(node.mode, SentenceMode::BlockStarter, "line {}", node.line);
        }
        for &child in children {
            let child = tree.node(child);
            assert_eq!(child.nesting_level, node.nesting_level + 1);
            assert_eq!(child.parent, Some(id));
        }
    }

    let lines: Vec<usize> = tree.sentences().iter().map(|n| n.line).collect();
    assert!(lines.windows(2).all(|w| w[0] <= w[1]), "{lines:?}");
    assert_eq!(tree.depth(), 3);
}

#[test]
fn test_parse_is_idempotent() {
    let stream = tokens(SAMPLE_PROGRAM);
    let registry = registry();
    let first = parse(&stream.tokens, &registry).unwrap();
    let second = parse(&stream.tokens, &registry).unwrap();

    assert_eq!(first.tree, second.tree);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn test_graceful_degradation() {
    let good = ["let a be 1", "speak a", "bless a", "let b be a plus 2", "wait"];
    let bad = [
        ("flarp a", RejectReason::UnknownLeadToken),
        ("bless a, b", RejectReason::ArityMismatch),
        ("break", RejectReason::InvalidContext),
        ("speak (a plus 1", RejectReason::UnbalancedGroup),
        ("otherwise", RejectReason::InvalidContext),
    ];

    for (position, (malformed, reason)) in bad.iter().enumerate() {
        let mut lines: Vec<&str> = good.to_vec();
        lines.insert(position, malformed);
        let source = lines.join("\n");

        let parsed = parse_source(&source).unwrap();
        assert_eq!(parsed.tree.sentences().len(), good.len(), "{source}");
        assert_eq!(parsed.diagnostics.len(), 1, "{source}");

        let diagnostic = &parsed.diagnostics[0];
        assert_eq!(diagnostic.code, reason.code());
        assert_eq!(diagnostic.line, position + 1);
        assert_eq!(diagnostic.severity, Severity::Error);
    }
}

#[test]
fn test_arity_is_enforced_for_every_instruction() {
    let registry = registry();

    for descriptor in registry.iter() {
        if descriptor.requires.is_some() || descriptor.opens == Some(BlockKind::Alternative) {
            continue;
        }
        let source = match descriptor.operand_shape {
            OperandShape::None => format!("{} a", descriptor.keyword),
            OperandShape::Single => format!("{} a, b", descriptor.keyword),
            OperandShape::Double => format!("{} a", descriptor.keyword),
            OperandShape::Variadic => descriptor.keyword.clone(),
        };

        let parsed = parse_source(&source).unwrap();
        assert!(parsed.tree.sentences().is_empty(), "{source}");
        assert_eq!(
            parsed.diagnostics.first().map(|d| d.code.as_str()),
            Some(RejectReason::ArityMismatch.code()),
            "{source}"
        );
    }
}

#[test]
fn test_incomplete_block_at_end_keeps_partial_tree() {
    let err = parse_source("let x be 1\nspeak x\nwhile x").unwrap_err();

    assert_eq!(err.code(), RejectReason::IncompleteBlock.code());
    assert_eq!(err.line(), 3);
    assert_eq!(err.diagnostic.severity, Severity::Fatal);
    assert_eq!(err.partial.sentences().len(), 2);
}

#[test]
fn test_rejected_block_skips_its_body() {
    let source = "flarp x\n    speak 1\n    speak 2\nspeak 3";
    let parsed = parse_source(source).unwrap();

    assert_eq!(parsed.diagnostics.len(), 1);
    let lines: Vec<usize> = parsed.tree.sentences().iter().map(|n| n.line).collect();
    assert_eq!(lines, vec![4]);
}

#[test]
fn test_orphan_indentation() {
    let parsed = parse_source("speak 1\n        speak 2\nspeak 3").unwrap();

    assert_eq!(parsed.tree.sentences().len(), 2);
    assert_eq!(parsed.diagnostics[0].code, RejectReason::OrphanIndentation.code());
    assert_eq!(parsed.diagnostics[0].line, 2);
}

#[test]
fn test_flow_inside_nested_blocks() {
    let source = "define run\n    while true\n        if true then break\n        return 1";
    let parsed = parse_source(source).unwrap();
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

    let parsed = parse_source("while true\n    return 1").unwrap();
    assert_eq!(parsed.diagnostics[0].code, RejectReason::InvalidContext.code());
}

#[test]
fn test_clarification_is_bound_to_declaration() {
    let parsed = parse_source("let x be set to a number\n    the number is 5").unwrap();
    let tree = &parsed.tree;
    let sentence = tree.sentences()[0];

    let Argument::Declaration {
        name,
        clarification: Some(child),
        ..
    } = &sentence.arguments[1]
    else {
        panic!("expected a clarified declaration, got {:?}", sentence.arguments);
    };
    assert_eq!(name, "number");

    let child = tree.node(*child);
    assert_eq!(child.mode, SentenceMode::Literal);
    assert_eq!(child.line, 2);
    assert_eq!(child.nesting_level, sentence.nesting_level + 1);
    assert_eq!(child.arguments, vec![Argument::name("number"), Argument::number("5")]);
}

#[test]
fn test_escalated_rejections_stop_early() {
    let stream = tokens("speak 1\nflarp\nspeak 2");
    let registry = registry();
    let config = ParserConfig {
        escalate_rejections: true,
        ..ParserConfig::default()
    };

    let err = Parser::new(&registry)
        .with_config(config)
        .parse(&stream.tokens)
        .unwrap_err();
    assert_eq!(err.code(), RejectReason::UnknownLeadToken.code());
    assert_eq!(err.partial.sentences().len(), 1);
}

#[test]
fn test_sink_sees_every_diagnostic_once() {
    let stream = tokens("flarp\nbless a, b\nspeak 1");
    let registry = registry();
    let sink = CollectingSink::new();

    let parsed = Parser::new(&registry)
        .parse_with_sink(&stream.tokens, &sink)
        .unwrap();
    assert_eq!(sink.snapshot(), parsed.diagnostics);
    assert_eq!(sink.len(), 2);
}

#[test]
fn test_tree_serializes() {
    let parsed = parse_source("let x be 1\nif x then speak x").unwrap();
    let json = serde_json::to_value(&parsed.tree).unwrap();

    let nodes = json["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), parsed.tree.len() + 1);
    assert_eq!(nodes[1]["lead"], "let");
    assert_eq!(nodes[2]["mode"], "BlockStarter");
}

#[test]
fn test_deep_groups_are_rejected_not_overflowed() {
    let depth = 3_000;
    let source = format!("speak {}1{}\nspeak 2", "(".repeat(depth), ")".repeat(depth));
    let parsed = parse_source(&source).unwrap();

    assert_eq!(parsed.diagnostics.len(), 1);
    assert_eq!(parsed.diagnostics[0].code, RejectReason::NestingTooDeep.code());
    assert_eq!(parsed.diagnostics[0].line, 1);
    assert_eq!(parsed.diagnostics[0].severity, Severity::Error);
    let lines: Vec<usize> = parsed.tree.sentences().iter().map(|n| n.line).collect();
    assert_eq!(lines, vec![2]);
}

#[test]
fn test_long_inline_chain_is_rejected() {
    let source = format!("{}wait\nwait", "if true then ".repeat(200));
    let parsed = parse_source(&source).unwrap();

    assert_eq!(parsed.diagnostics.len(), 1);
    assert_eq!(parsed.diagnostics[0].code, RejectReason::NestingTooDeep.code());
    assert_eq!(parsed.tree.sentences().len(), 1);
}

#[test]
fn test_else_after_rejected_if_is_kept() {
    let source = "let x be 1\nif x y\n    wait\nelse\n    wait\nspeak x";
    let parsed = parse_source(source).unwrap();

    assert_eq!(parsed.diagnostics.len(), 1);
    assert_eq!(parsed.diagnostics[0].code, RejectReason::ArityMismatch.code());
    assert_eq!(parsed.diagnostics[0].line, 2);

    let lines: Vec<usize> = parsed.tree.sentences().iter().map(|n| n.line).collect();
    assert_eq!(lines, vec![1, 4, 5, 6]);
}

#[test]
fn test_else_after_incomplete_if_is_kept() {
    let parsed = parse_source("if true\nelse\n    wait").unwrap();
    let codes: Vec<&str> = parsed.diagnostics.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec![RejectReason::IncompleteBlock.code()]);
    assert_eq!(parsed.tree.sentences().len(), 2);
}

#[test]
fn test_block_header_declaration_is_clarified() {
    let source = "let x be 1\nwhile x below a number\n    the number is 5\n    wait";
    let parsed = parse_source(source).unwrap();
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

    let tree = &parsed.tree;
    let sentences = tree.sentences();
    let lines: Vec<usize> = sentences.iter().map(|n| n.line).collect();
    assert_eq!(lines, vec![1, 2, 4]);

    let header = sentences[1];
    assert_eq!(header.mode, SentenceMode::BlockStarter);
    assert_eq!(header.children.len(), 1);
    let Argument::Expr(pieces) = &header.arguments[0] else {
        panic!("expected an expression header, got {:?}", header.arguments);
    };
    let Argument::Declaration {
        clarification: Some(child),
        ..
    } = &pieces[2]
    else {
        panic!("expected a clarified declaration, got {pieces:?}");
    };
    assert_eq!(tree.node(*child).line, 3);
}

#[test]
fn test_block_header_takes_several_clarifications() {
    let source = "if a left exceeds a right\n    the left is 3\n    the right is 2\n    the left is 9";
    let parsed = parse_source(source).unwrap();
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

    // 头部声明都已澄清后，同样形式的行就是块体里的字面句
    let sentences = parsed.tree.sentences();
    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[1].mode, SentenceMode::Literal);
    assert_eq!(sentences[1].line, 4);
}

#[test]
fn test_raw_text_keeps_source_spacing() {
    let parsed = parse_source("let x be(1)\nspeak  x,y").unwrap();
    let raws: Vec<&str> = parsed.tree.sentences().iter().map(|n| n.raw.as_str()).collect();
    assert_eq!(raws, vec!["let x be(1)", "speak  x,y"]);
}

#[test]
fn test_import_only_at_top_level() {
    let parsed = parse_source("import \"lib.ql\"\nwhile true\n    import \"other.ql\"").unwrap();
    let codes: Vec<&str> = parsed.diagnostics.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec![RejectReason::InvalidContext.code()]);
    assert_eq!(parsed.diagnostics[0].line, 3);
}
