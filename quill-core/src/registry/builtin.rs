//! 内置指令表和语法词表

use super::descriptor::{
    BlockKind, Category, CommandVerb, InstructionDescriptor, OperandKind, OperandShape, VerbClass,
};
use super::GrammarWord;

pub(super) fn grammar_words() -> Vec<(&'static str, GrammarWord)> {
    let mut words = vec![
        ("be", GrammarWord::Connective),
        ("set", GrammarWord::Connective),
        ("to", GrammarWord::Connective),
        ("is", GrammarWord::Connective),
        ("in", GrammarWord::Connective),
        ("into", GrammarWord::Connective),
        ("from", GrammarWord::Connective),
        ("with", GrammarWord::Connective),
        ("as", GrammarWord::Connective),
        ("of", GrammarWord::Connective),
        ("a", GrammarWord::Article),
        ("an", GrammarWord::Article),
        ("the", GrammarWord::Article),
        ("then", GrammarWord::Continuation),
    ];

    for verb in [
        CommandVerb::Clear,
        CommandVerb::Reset,
        CommandVerb::Remove,
        CommandVerb::Sort,
        CommandVerb::Reverse,
    ] {
        words.push((verb.participle(), GrammarWord::Participle(verb)));
    }

    words
}

pub(super) fn descriptors() -> Vec<InstructionDescriptor> {
    use OperandKind::{Label, Path, Reference, Target, Value};

    vec![
        // Memory
        InstructionDescriptor::new("let", Category::Memory, OperandShape::Double)
            .alias("make")
            .described("Bind a value to a name, or apply a command to it")
            .verb(VerbClass::Assignment)
            .operands(&[Target, Value]),
        InstructionDescriptor::new("store", Category::Memory, OperandShape::Double)
            .described("Store a value into a named slot")
            .verb(VerbClass::Assignment)
            .operands(&[Value, Target]),
        InstructionDescriptor::new("recall", Category::Memory, OperandShape::Single)
            .described("Read back a stored value")
            .verb(VerbClass::Recall)
            .operands(&[Reference]),
        // IO
        InstructionDescriptor::new("speak", Category::Io, OperandShape::Variadic)
            .alias("say")
            .alias("print")
            .described("Write values to the output")
            .verb(VerbClass::Output)
            .operands(&[Value]),
        InstructionDescriptor::new("hear", Category::Io, OperandShape::Single)
            .described("Read input into a name")
            .verb(VerbClass::Input)
            .operands(&[Target]),
        InstructionDescriptor::new("wait", Category::Io, OperandShape::None)
            .described("Pause for one step"),
        // Logic
        InstructionDescriptor::new("bless", Category::Logic, OperandShape::Single)
            .alias("increase")
            .described("Increase a value by one")
            .verb(VerbClass::Mutation)
            .operands(&[Reference]),
        InstructionDescriptor::new("curse", Category::Logic, OperandShape::Single)
            .alias("decrease")
            .described("Decrease a value by one")
            .verb(VerbClass::Mutation)
            .operands(&[Reference]),
        // Control
        InstructionDescriptor::new("if", Category::Control, OperandShape::Single)
            .alias("when")
            .described("Run the block when the condition holds")
            .opens(BlockKind::Conditional)
            .operands(&[Value]),
        InstructionDescriptor::new("else", Category::Control, OperandShape::None)
            .alias("otherwise")
            .described("Run the block when the preceding condition failed")
            .opens(BlockKind::Alternative),
        InstructionDescriptor::new("while", Category::Control, OperandShape::Single)
            .described("Repeat the block while the condition holds")
            .opens(BlockKind::Loop)
            .operands(&[Value]),
        InstructionDescriptor::new("define", Category::Control, OperandShape::Single)
            .described("Define a named routine")
            .opens(BlockKind::Routine)
            .operands(&[Target]),
        // Flow
        InstructionDescriptor::new("go", Category::Flow, OperandShape::Single)
            .described("Jump to a label")
            .verb(VerbClass::Transfer)
            .operands(&[Label]),
        InstructionDescriptor::new("walk", Category::Flow, OperandShape::Single)
            .alias("call")
            .described("Invoke a routine and come back")
            .verb(VerbClass::Transfer)
            .operands(&[Label]),
        InstructionDescriptor::new("break", Category::Flow, OperandShape::None)
            .described("Leave the innermost loop")
            .verb(VerbClass::Transfer)
            .requires(BlockKind::Loop),
        InstructionDescriptor::new("return", Category::Flow, OperandShape::Single)
            .described("Leave the routine with a value")
            .verb(VerbClass::Transfer)
            .requires(BlockKind::Routine)
            .operands(&[Value]),
        // Module
        InstructionDescriptor::new("import", Category::Module, OperandShape::Single)
            .described("Pull in the sentences of another source file")
            .verb(VerbClass::Import)
            .operands(&[Path]),
    ]
}
