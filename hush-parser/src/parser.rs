use crate::ast::{
    Command, CommandKind, CommandList, Followup, Pipe, Redirect, RedirectKind, RedirectTarget,
    ReservedWord,
};
use crate::charclass::{CharClass, CharClassTable};
use crate::error::ParseError;
use crate::input::InputStream;
use crate::word::{SpecialParameter, TokenBuffer, Word, WordPiece, is_valid_name};

/// Why a scan over the input stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanEnd {
    /// The requested terminator was found outside any compound statement.
    Terminator,
    /// The input ran out.
    EndOfInput,
}

/// A command that is still collecting words, a group, or redirections.
#[derive(Default)]
struct OpenCommand {
    words: Vec<Word>,
    group: Option<(CommandList, bool)>,
    redirects: Vec<Redirect>,
}

impl OpenCommand {
    fn is_null(&self) -> bool {
        self.words.is_empty() && self.group.is_none() && self.redirects.is_empty()
    }

    fn into_command(self) -> Command {
        let kind = match self.group {
            Some((list, subshell)) => CommandKind::Group { list, subshell },
            None => CommandKind::Simple(self.words),
        };

        Command {
            kind,
            redirects: self.redirects,
        }
    }
}

/// A redirection operator still waiting for its target word.
struct PendingRedirect {
    kind: RedirectKind,
    fd: i32,
}

/// The cursor into one list under construction.
#[derive(Default)]
struct Context {
    pipes: Vec<Pipe>,
    stages: Vec<Command>,
    command: OpenCommand,
    pending_redirect: Option<PendingRedirect>,
    reserved: Option<ReservedWord>,
}

/// The state of one (possibly nested) scan: the open context plus the saved
/// outer contexts of the compound statements it is inside of.
#[derive(Default)]
struct Frame {
    current: Context,
    stack: Vec<Context>,
}

const fn starts_compound(word: ReservedWord) -> bool {
    matches!(
        word,
        ReservedWord::If | ReservedWord::For | ReservedWord::While | ReservedWord::Until
    )
}

const fn ends_compound(word: ReservedWord) -> bool {
    matches!(word, ReservedWord::Fi | ReservedWord::Done)
}

/// Returns whether `next` may follow `prev` within one compound statement.
const fn may_follow(prev: ReservedWord, next: ReservedWord) -> bool {
    use ReservedWord as R;

    match prev {
        R::If | R::Elif => matches!(next, R::Then),
        R::Then => matches!(next, R::Elif | R::Else | R::Fi),
        R::Else => matches!(next, R::Fi),
        R::For => matches!(next, R::In),
        R::While | R::Until | R::In => matches!(next, R::Do),
        R::Do => matches!(next, R::Done),
        R::Fi | R::Done => false,
    }
}

/// Incrementally parses statements from an [`InputStream`].
pub struct Parser<'a> {
    input: InputStream<'a>,
    classes: CharClassTable,
    at_eof: bool,
}

impl<'a> Parser<'a> {
    /// Returns a new parser reading from `input`.
    pub fn new(input: InputStream<'a>) -> Self {
        Self {
            input,
            classes: CharClassTable::default(),
            at_eof: false,
        }
    }

    /// Updates the field separators used to split words. Takes effect from
    /// the next statement.
    pub fn set_ifs(&mut self, ifs: Option<&str>) {
        if ifs.unwrap_or(crate::charclass::DEFAULT_IFS) != self.classes.ifs() {
            self.classes = CharClassTable::new(ifs);
        }
    }

    /// Parses the next statement: everything up to an unquoted newline that
    /// isn't inside a compound statement, group, or substitution.
    ///
    /// Returns `Ok(None)` once the input is exhausted. After a syntax error the
    /// rest of the offending line is discarded, so parsing can resume with the
    /// next call.
    pub fn parse_statement(&mut self) -> Result<Option<CommandList>, ParseError> {
        if self.at_eof {
            return Ok(None);
        }

        self.input.start_statement();

        match self.parse_statement_inner() {
            Ok(list) => {
                tracing::debug!(target: "parse", "statement: {list:?}");
                if self.at_eof && list.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(list))
                }
            }
            Err(err) => {
                tracing::debug!(target: "parse", "parse error: {err:?}");
                if self.at_eof
                    || err.is_end_of_input()
                    || matches!(err, ParseError::ReadError(_))
                    || self.input.discard_line().is_err()
                {
                    self.at_eof = true;
                }
                Err(err)
            }
        }
    }

    fn parse_statement_inner(&mut self) -> Result<CommandList, ParseError> {
        let mut frame = Frame::default();
        let mut buffer = TokenBuffer::default();

        if self.scan(&mut frame, &mut buffer, Some('\n'))? == ScanEnd::EndOfInput {
            self.at_eof = true;
        }

        if buffer.in_double_quotes {
            return Err(ParseError::UnterminatedQuote('"'));
        }

        Self::finish_frame(frame, &mut buffer)
    }

    /// Consumes characters until `end` is seen outside any compound statement,
    /// or until the input runs out.
    fn scan(
        &mut self,
        frame: &mut Frame,
        buffer: &mut TokenBuffer,
        end: Option<char>,
    ) -> Result<ScanEnd, ParseError> {
        while let Some(c) = self.input.next_char()? {
            let class = self.classes.classify(c);
            let quoted = buffer.in_double_quotes;

            if class == CharClass::Literal
                || (quoted && matches!(class, CharClass::Special | CharClass::FieldSeparator))
            {
                buffer.push_char(c, quoted);
                continue;
            }

            if class == CharClass::FieldSeparator {
                Self::done_word(frame, buffer)?;
                if end.is_some() && c == '\n' && !awaiting_for_list(&frame.current) {
                    Self::done_pipe(frame, Followup::Sequence)?;
                }
            }

            if Some(c) == end && !quoted && frame.current.reserved.is_none() {
                return Ok(ScanEnd::Terminator);
            }

            if class == CharClass::FieldSeparator {
                continue;
            }

            match c {
                '#' => {
                    if buffer.is_null() {
                        self.skip_comment()?;
                    } else {
                        buffer.push_char(c, quoted);
                    }
                }
                '\\' => self.parse_backslash(buffer)?,
                '$' => self.parse_dollar(buffer)?,
                '\'' => {
                    if quoted {
                        buffer.push_char(c, true);
                    } else {
                        self.parse_single_quoted(buffer)?;
                    }
                }
                '"' => {
                    buffer.nonnull = true;
                    buffer.in_double_quotes = !quoted;
                }
                '`' => {
                    let list = self.parse_command_substitution('`')?;
                    buffer.push_piece(WordPiece::CommandSubstitution { list, quoted });
                }
                '>' | '<' => self.parse_redirect(frame, buffer, c)?,
                ';' => {
                    Self::done_word(frame, buffer)?;
                    Self::done_pipe(frame, Followup::Sequence)?;
                }
                '&' => {
                    Self::done_word(frame, buffer)?;
                    if self.input.peek_char()? == Some('&') {
                        self.input.next_char()?;
                        Self::done_pipe(frame, Followup::And)?;
                    } else {
                        Self::done_pipe(frame, Followup::Background)?;
                    }
                }
                '|' => {
                    Self::done_word(frame, buffer)?;
                    if self.input.peek_char()? == Some('|') {
                        self.input.next_char()?;
                        Self::done_pipe(frame, Followup::Or)?;
                    } else {
                        Self::done_command(&mut frame.current)?;
                    }
                }
                '(' | '{' => self.parse_group(frame, buffer, c)?,
                ')' | '}' => return Err(ParseError::UnexpectedChar(c)),
                _ => buffer.push_char(c, quoted),
            }
        }

        Ok(ScanEnd::EndOfInput)
    }

    fn skip_comment(&mut self) -> Result<(), ParseError> {
        while let Some(c) = self.input.peek_char()? {
            if c == '\n' {
                break;
            }
            self.input.next_char()?;
        }
        Ok(())
    }

    fn parse_backslash(&mut self, buffer: &mut TokenBuffer) -> Result<(), ParseError> {
        let Some(c) = self.input.next_char()? else {
            return Err(ParseError::TrailingBackslash);
        };

        // Line continuation.
        if c == '\n' {
            return Ok(());
        }

        if buffer.in_double_quotes && !matches!(c, '$' | '`' | '"' | '\\') {
            buffer.push_char('\\', true);
        }
        buffer.push_char(c, true);

        Ok(())
    }

    fn parse_single_quoted(&mut self, buffer: &mut TokenBuffer) -> Result<(), ParseError> {
        buffer.nonnull = true;
        loop {
            match self.input.next_char()? {
                None => return Err(ParseError::UnterminatedQuote('\'')),
                Some('\'') => return Ok(()),
                Some(c) => buffer.push_char(c, true),
            }
        }
    }

    fn parse_dollar(&mut self, buffer: &mut TokenBuffer) -> Result<(), ParseError> {
        let quoted = buffer.in_double_quotes;

        let special = |param| WordPiece::Special { param, quoted };

        let piece = match self.input.peek_char()? {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(c) = self.input.peek_char()? {
                    if !c.is_ascii_alphanumeric() && c != '_' {
                        break;
                    }
                    name.push(c);
                    self.input.next_char()?;
                }

                if name == "_" {
                    return Err(ParseError::UnsupportedParameter('_'));
                }

                WordPiece::Variable { name, quoted }
            }
            Some(c) if c.is_ascii_digit() => {
                self.input.next_char()?;
                let index = c
                    .to_digit(10)
                    .and_then(|d| usize::try_from(d).ok())
                    .unwrap_or_default();
                WordPiece::Positional { index, quoted }
            }
            Some('$') => {
                self.input.next_char()?;
                special(SpecialParameter::ShellPid)
            }
            Some('?') => {
                self.input.next_char()?;
                special(SpecialParameter::LastStatus)
            }
            Some('!') => {
                self.input.next_char()?;
                special(SpecialParameter::LastBackgroundPid)
            }
            Some('#') => {
                self.input.next_char()?;
                special(SpecialParameter::PositionalCount)
            }
            Some('*') => {
                self.input.next_char()?;
                special(SpecialParameter::AllPositional)
            }
            Some('{') => {
                self.input.next_char()?;
                let name = self.read_braced_name()?;
                Self::braced_parameter(name, quoted)?
            }
            Some('(') => {
                self.input.next_char()?;
                let list = self.parse_command_substitution(')')?;
                WordPiece::CommandSubstitution { list, quoted }
            }
            Some(c @ ('@' | '-')) => return Err(ParseError::UnsupportedParameter(c)),
            _ => {
                buffer.push_char('$', quoted);
                return Ok(());
            }
        };

        buffer.push_piece(piece);
        Ok(())
    }

    fn read_braced_name(&mut self) -> Result<String, ParseError> {
        let mut name = String::new();
        loop {
            match self.input.next_char()? {
                None => return Err(ParseError::UnterminatedBraceExpansion),
                Some('}') => return Ok(name),
                Some(c) => name.push(c),
            }
        }
    }

    fn braced_parameter(name: String, quoted: bool) -> Result<WordPiece, ParseError> {
        if let Some(c @ ('@' | '-' | '_')) = name.chars().next()
            && name.len() == 1
        {
            return Err(ParseError::UnsupportedParameter(c));
        }

        let param = match name.as_str() {
            "$" => Some(SpecialParameter::ShellPid),
            "?" => Some(SpecialParameter::LastStatus),
            "!" => Some(SpecialParameter::LastBackgroundPid),
            "#" => Some(SpecialParameter::PositionalCount),
            "*" => Some(SpecialParameter::AllPositional),
            _ => None,
        };

        if let Some(param) = param {
            return Ok(WordPiece::Special { param, quoted });
        }

        if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(index) = name.parse() {
                return Ok(WordPiece::Positional { index, quoted });
            }
        }

        Ok(WordPiece::Variable { name, quoted })
    }

    /// Parses the body of a command substitution up to `end`, from the same
    /// input stream.
    fn parse_command_substitution(&mut self, end: char) -> Result<CommandList, ParseError> {
        let mut frame = Frame::default();
        let mut buffer = TokenBuffer::default();

        if self.scan(&mut frame, &mut buffer, Some(end))? == ScanEnd::EndOfInput {
            return Err(ParseError::UnterminatedCommandSubstitution);
        }

        Self::finish_frame(frame, &mut buffer)
    }

    fn parse_group(
        &mut self,
        frame: &mut Frame,
        buffer: &mut TokenBuffer,
        open: char,
    ) -> Result<(), ParseError> {
        let command = &frame.current.command;
        if !buffer.is_null() || !command.words.is_empty() || command.group.is_some() {
            return Err(ParseError::GroupWithArguments);
        }
        if let Some(pending) = &frame.current.pending_redirect {
            return Err(ParseError::MissingRedirectTarget(pending.kind));
        }

        let (close, subshell) = if open == '(' {
            (')', true)
        } else {
            ('}', false)
        };

        let mut sub_frame = Frame::default();
        let mut sub_buffer = TokenBuffer::default();
        if self.scan(&mut sub_frame, &mut sub_buffer, Some(close))? == ScanEnd::EndOfInput {
            return Err(ParseError::UnterminatedGroup(close));
        }

        let list = Self::finish_frame(sub_frame, &mut sub_buffer)?;
        frame.current.command.group = Some((list, subshell));

        // The command stays open so redirections may follow the group.
        Ok(())
    }

    fn parse_redirect(
        &mut self,
        frame: &mut Frame,
        buffer: &mut TokenBuffer,
        op: char,
    ) -> Result<(), ParseError> {
        let explicit_fd = buffer.as_fd_number();
        if explicit_fd.is_some() {
            buffer.reset();
        }

        Self::done_word(frame, buffer)?;

        let next = self.input.peek_char()?;
        let kind = match (op, next) {
            (_, Some('(')) => return Err(ParseError::UnsupportedProcessSubstitution),
            ('>', Some('>')) => RedirectKind::Append,
            ('>', _) => RedirectKind::Overwrite,
            ('<', Some('<')) => RedirectKind::HereDocument,
            ('<', Some('>')) => RedirectKind::ReadWrite,
            _ => RedirectKind::Input,
        };
        if !matches!(kind, RedirectKind::Overwrite | RedirectKind::Input) {
            self.input.next_char()?;
        }

        if let Some(pending) = &frame.current.pending_redirect {
            return Err(ParseError::MissingRedirectTarget(pending.kind));
        }

        let fd = explicit_fd.unwrap_or_else(|| kind.default_fd());

        match self.parse_duplicate_target()? {
            Some(target) => frame
                .current
                .command
                .redirects
                .push(Redirect { kind, fd, target }),
            None => frame.current.pending_redirect = Some(PendingRedirect { kind, fd }),
        }

        Ok(())
    }

    /// Looks for a `&N` or `&-` target immediately after a redirection operator.
    fn parse_duplicate_target(&mut self) -> Result<Option<RedirectTarget>, ParseError> {
        if self.input.peek_char()? != Some('&') {
            return Ok(None);
        }
        self.input.next_char()?;

        if self.input.peek_char()? == Some('-') {
            self.input.next_char()?;
            return Ok(Some(RedirectTarget::Close));
        }

        let mut digits = String::new();
        while let Some(c) = self.input.peek_char()? {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.input.next_char()?;
        }

        digits
            .parse()
            .map(|fd| Some(RedirectTarget::Duplicate(fd)))
            .map_err(|_| ParseError::AmbiguousRedirect)
    }

    /// Completes the word in `buffer`, giving it to a pending redirection,
    /// treating it as a reserved word, or appending it to the open command.
    fn done_word(frame: &mut Frame, buffer: &mut TokenBuffer) -> Result<(), ParseError> {
        if buffer.is_null() {
            return Ok(());
        }

        let ctx = &mut frame.current;
        if let Some(PendingRedirect { kind, fd }) = ctx.pending_redirect.take() {
            ctx.command.redirects.push(Redirect {
                kind,
                fd,
                target: RedirectTarget::Path(buffer.take_word()),
            });
            return Ok(());
        }

        if ctx.command.group.is_some() {
            return Err(ParseError::GroupWithArguments);
        }

        let word = buffer.take_word();

        if ctx.command.words.is_empty() {
            if let Some(reserved) = word.as_plain_text().and_then(ReservedWord::from_word) {
                return Self::reserved_word(frame, reserved);
            }
        }

        ctx.command.words.push(word);

        // The loop variable of a `for` forms a pipe of its own.
        if ctx.reserved == Some(ReservedWord::For) {
            Self::done_pipe(frame, Followup::Sequence)?;
        }

        Ok(())
    }

    /// Drives the compound-statement state machine for a reserved word.
    fn reserved_word(frame: &mut Frame, word: ReservedWord) -> Result<(), ParseError> {
        tracing::debug!(target: "parse", "reserved word: {word}");

        if starts_compound(word) {
            if matches!(
                frame.current.reserved,
                Some(ReservedWord::In | ReservedWord::For)
            ) {
                return Err(ParseError::UnexpectedReservedWord(word));
            }

            let outer = std::mem::take(&mut frame.current);
            frame.stack.push(outer);
        } else if !frame
            .current
            .reserved
            .is_some_and(|prev| may_follow(prev, word))
        {
            return Err(ParseError::UnexpectedReservedWord(word));
        }

        frame.current.reserved = Some(word);

        if ends_compound(word) {
            Self::done_pipe(frame, Followup::Sequence)?;

            let Some(outer) = frame.stack.pop() else {
                return Err(ParseError::UnexpectedReservedWord(word));
            };
            let inner = std::mem::replace(&mut frame.current, outer);

            validate_for_loops(&inner.pipes)?;

            frame.current.command.group = Some((CommandList { pipes: inner.pipes }, false));
        }

        Ok(())
    }

    /// Commits the open command to the open pipe.
    fn done_command(ctx: &mut Context) -> Result<(), ParseError> {
        if let Some(pending) = &ctx.pending_redirect {
            return Err(ParseError::MissingRedirectTarget(pending.kind));
        }

        let command = std::mem::take(&mut ctx.command);
        if !command.is_null() {
            ctx.stages.push(command.into_command());
        }

        Ok(())
    }

    /// Commits the open pipe, recording how it connects to the next one.
    fn done_pipe(frame: &mut Frame, followup: Followup) -> Result<(), ParseError> {
        let ctx = &mut frame.current;
        Self::done_command(ctx)?;

        ctx.pipes.push(Pipe {
            commands: std::mem::take(&mut ctx.stages),
            followup,
            role: ctx.reserved,
        });

        Ok(())
    }

    /// Closes off the last word and pipe of a frame, yielding its list.
    fn finish_frame(mut frame: Frame, buffer: &mut TokenBuffer) -> Result<CommandList, ParseError> {
        Self::done_word(&mut frame, buffer)?;
        Self::done_pipe(&mut frame, Followup::Sequence)?;

        if let Some(word) = frame.current.reserved {
            return Err(ParseError::UnterminatedStatement(word));
        }

        let pipes = frame
            .current
            .pipes
            .into_iter()
            .filter(|pipe| !pipe.commands.is_empty() || pipe.role.is_some())
            .collect();

        Ok(CommandList { pipes })
    }
}

/// Returns whether a `for` has taken its loop variable and is still waiting
/// for `in`, which may come after a newline.
fn awaiting_for_list(ctx: &Context) -> bool {
    ctx.reserved == Some(ReservedWord::For)
        && ctx.command.is_null()
        && ctx.stages.is_empty()
        && ctx
            .pipes
            .last()
            .is_some_and(|pipe| pipe.role == Some(ReservedWord::For))
}

/// Checks that every `for` pipe names one variable and is followed by an
/// `in` list, and that `in` lists aren't split across pipes.
fn validate_for_loops(pipes: &[Pipe]) -> Result<(), ParseError> {
    for (i, pipe) in pipes.iter().enumerate() {
        let next = pipes.get(i + 1);
        match pipe.role {
            Some(ReservedWord::For) => {
                let valid_name = match pipe.commands.as_slice() {
                    [command] => match command.words() {
                        [word] => word.as_plain_text().is_some_and(is_valid_name),
                        _ => false,
                    },
                    _ => false,
                };

                if !valid_name || next.is_none_or(|p| p.role != Some(ReservedWord::In)) {
                    return Err(ParseError::MalformedForLoop);
                }
            }
            Some(ReservedWord::In) => match next {
                None => return Err(ParseError::MalformedForLoop),
                Some(p) if p.role == Some(ReservedWord::In) && !p.commands.is_empty() => {
                    return Err(ParseError::MalformedForLoop);
                }
                _ => {}
            },
            _ => {}
        }
    }

    Ok(())
}

/// Parses all statements in `input`, stopping at the first syntax error.
/// Blank statements are skipped.
pub fn parse_str(input: &str) -> Result<Vec<CommandList>, ParseError> {
    let mut parser = Parser::new(InputStream::from_string(input));
    let mut statements = vec![];
    while let Some(statement) = parser.parse_statement()? {
        if !statement.is_empty() {
            statements.push(statement);
        }
    }
    Ok(statements)
}
