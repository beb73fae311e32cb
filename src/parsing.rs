/// Represents the state of parsing for a generic type.
pub enum ParsingState<T> {
    /// Indicates that the end of the file has been reached.
    EOF,
    /// Contains an error message indicating what went wrong during parsing.
    Error(String),
    /// Contains the successfully parsed value of type `T`.
    Finished(T),
}

/// Trait for a lexer that reads input and returns parsed tokens.
pub trait Lexer {
    /// Looks up the next token in the input stream.
    fn lookup(&mut self) -> ParsingState<String>;
    /// Consumes and returns the next token from the input stream.
    fn consume_next_token(&mut self) -> ParsingState<String>;
    /// Returns the current position in the input stream.
    fn get_current_position(&self) -> String;
}

/// Trait for parsing a generic type `T` from a lexer.
pub trait Parser<T> {
    /// Parses an instance of type `T` from the provided lexer.
    fn parse(lexer: &mut dyn Lexer) -> ParsingState<T>;
}
