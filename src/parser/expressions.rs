//! Expression parsing implementation
//!
//! Recursive descent, one method per precedence level (lowest first):
//!
//! ```text
//! or          ::= and ( "OR" and )*
//! and         ::= relational ( "AND" relational )*
//! relational  ::= additive ( relop additive )*        -- chains: a < b < c
//! additive    ::= multiplicative ( ("+" | "-") multiplicative )*
//! multiplicative ::= prefix ( ("*" | "/" | "%") prefix )*
//! prefix      ::= ("!" | "-") prefix | exponent
//! exponent    ::= postfix ( "^" prefix )?             -- right-associative
//! postfix     ::= primary format?
//! ```
//!
//! Each level returns a [`Typed`] expression and applies the static typing
//! rules from [`super::semantics`] as it builds the node.

use crate::environment::{Binding, VarType};
use crate::parser::ast::*;
use crate::parser::lexer::decode_comms;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::semantics::{assignable, binary_type, unary_type, StaticType, Typed};
use crate::parser::token::TokenKind;

impl Parser {
    /// Expression where exactly one value is expected
    pub(crate) fn parse_expression(&mut self) -> Result<Typed, ParseError> {
        let typed = self.parse_or()?;
        self.expect_single_value(&typed)?;
        Ok(typed)
    }

    /// Reject calls that yield no value or several, and whole rows
    pub(crate) fn expect_single_value(&self, typed: &Typed) -> Result<(), ParseError> {
        let span = typed.expr.span();
        match typed.ty {
            StaticType::Void => Err(ParseError::semantic(
                format!("{} does not recall a value", describe_call(&typed.expr)),
                span,
            )),
            StaticType::Multi(n) => Err(ParseError::semantic(
                format!(
                    "{} recalls {} values; only a batch declaration of {} names can take them",
                    describe_call(&typed.expr),
                    n,
                    n
                ),
                span,
            )),
            StaticType::Row(_) => Err(ParseError::semantic(
                "a whole row can only initialize an array declaration",
                span,
            )),
            _ => Ok(()),
        }
    }

    /// Any expression, including calls that yield zero or several values
    pub(crate) fn parse_or(&mut self) -> Result<Typed, ParseError> {
        let mut left = self.parse_and()?;
        while self.match_token(TokenKind::Or) {
            let right = self.parse_and()?;
            left = self.binary(BinOp::Or, left, right)?;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Typed, ParseError> {
        let mut left = self.parse_relational()?;
        while self.match_token(TokenKind::And) {
            let right = self.parse_relational()?;
            left = self.binary(BinOp::And, left, right)?;
        }
        Ok(left)
    }

    /// Relational operators chain: `a < b <= c` holds when every adjacent
    /// pair holds
    fn parse_relational(&mut self) -> Result<Typed, ParseError> {
        let first = self.parse_additive()?;
        let mut operands = vec![first];
        let mut ops = Vec::new();

        while let Some(op) = self.relational_op() {
            self.advance();
            ops.push(op);
            operands.push(self.parse_additive()?);
        }

        if ops.is_empty() {
            return Ok(operands.remove(0));
        }
        if ops.len() == 1 {
            let right = operands.pop();
            let left = operands.pop();
            if let (Some(left), Some(right)) = (left, right) {
                return self.binary(ops[0], left, right);
            }
        }

        for operand in &operands {
            self.expect_single_value(operand)?;
        }
        let span = operands[0]
            .expr
            .span()
            .to(operands[operands.len() - 1].expr.span());
        for (pair, op) in operands.windows(2).zip(&ops) {
            binary_type(*op, pair[0].ty, pair[1].ty)
                .map_err(|message| ParseError::semantic(message, span))?;
        }

        Ok(Typed::new(
            Expr::Chain {
                operands: operands.into_iter().map(|t| t.expr).collect(),
                ops,
                span,
            },
            StaticType::Flag,
        ))
    }

    fn relational_op(&self) -> Option<BinOp> {
        match self.peek_kind() {
            TokenKind::Lt => Some(BinOp::Lt),
            TokenKind::Le => Some(BinOp::Le),
            TokenKind::Gt => Some(BinOp::Gt),
            TokenKind::Ge => Some(BinOp::Ge),
            TokenKind::EqEq => Some(BinOp::Eq),
            TokenKind::NotEq => Some(BinOp::Ne),
            _ => None,
        }
    }

    fn parse_additive(&mut self) -> Result<Typed, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right)?;
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Typed, ParseError> {
        let mut left = self.parse_prefix()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_prefix()?;
            left = self.binary(op, left, right)?;
        }
        Ok(left)
    }

    /// `!x` and `-x`
    fn parse_prefix(&mut self) -> Result<Typed, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Bang => UnOp::Not,
            TokenKind::Neg | TokenKind::Minus => UnOp::Neg,
            _ => return self.parse_exponent(),
        };
        let start = self.current_location();
        self.advance();

        let operand = self.parse_prefix()?;
        self.expect_single_value(&operand)?;
        let span = self.span_from(start);
        let ty = unary_type(op, operand.ty).map_err(|m| ParseError::semantic(m, span))?;

        Ok(Typed::new(
            Expr::Unary {
                op,
                operand: Box::new(operand.expr),
                span,
            },
            ty,
        ))
    }

    /// `base ^ exponent`, right-associative
    fn parse_exponent(&mut self) -> Result<Typed, ParseError> {
        let base = self.parse_postfix()?;
        if self.match_token(TokenKind::Caret) {
            let exponent = self.parse_prefix()?;
            return self.binary(BinOp::Pow, base, exponent);
        }
        Ok(base)
    }

    /// Primary followed by an optional `.Nf` display suffix
    fn parse_postfix(&mut self) -> Result<Typed, ParseError> {
        let operand = self.parse_primary()?;
        if !self.check(TokenKind::Format) {
            return Ok(operand);
        }

        let token = self.advance();
        self.expect_single_value(&operand)?;
        let span = operand.expr.span().to(token.span());
        let digits = token
            .lexeme
            .trim_start_matches('.')
            .trim_end_matches('f')
            .parse::<usize>()
            .map_err(|_| ParseError::syntax("invalid format suffix", token.span()))?;

        if operand.ty.is_known() && !operand.ty.is_numeric() {
            return Err(ParseError::semantic(
                format!("'.{}f' formats numbers, found {}", digits, operand.ty),
                span,
            ));
        }

        Ok(Typed::new(
            Expr::Format {
                operand: Box::new(operand.expr),
                digits,
                span,
            },
            StaticType::Comms,
        ))
    }

    fn parse_primary(&mut self) -> Result<Typed, ParseError> {
        let token = self.peek().clone();
        let span = token.span();

        match token.kind {
            TokenKind::HpLiteral => {
                self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    ParseError::syntax(format!("invalid hp literal '{}'", token.lexeme), span)
                })?;
                Ok(Typed::new(Expr::HpLiteral(value, span), StaticType::Hp))
            }
            TokenKind::XpLiteral => {
                self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    ParseError::syntax(format!("invalid xp literal '{}'", token.lexeme), span)
                })?;
                Ok(Typed::new(Expr::XpLiteral(value, span), StaticType::Xp))
            }
            TokenKind::CommsLiteral => {
                self.advance();
                Ok(Typed::new(
                    Expr::CommsLiteral(decode_comms(&token.lexeme), span),
                    StaticType::Comms,
                ))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(Typed::new(
                    Expr::FlagLiteral(token.kind == TokenKind::True, span),
                    StaticType::Flag,
                ))
            }
            TokenKind::Dead => {
                self.advance();
                Ok(Typed::new(Expr::Dead(span), StaticType::Dead))
            }
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines();
                let inner = self.parse_expression()?;
                self.skip_newlines();
                self.expect_token(TokenKind::RParen, "Expected ')' after expression")?;
                Ok(inner)
            }
            TokenKind::Identifier(_) => {
                let (name, name_span) = self.expect_identifier("")?;
                if self.check(TokenKind::LParen) {
                    return self.parse_call(name, name_span);
                }
                let indices = self.parse_index_list()?;
                self.parse_after_name(name, name_span, indices)
            }
            TokenKind::Rounds => self.parse_rounds(),
            TokenKind::ToHp => self.parse_conversion(Conversion::ToHp),
            TokenKind::ToXp => self.parse_conversion(Conversion::ToXp),
            TokenKind::ToComms => self.parse_conversion(Conversion::ToComms),
            TokenKind::LevelUp => self.parse_conversion(Conversion::LevelUp),
            TokenKind::LevelDown => self.parse_conversion(Conversion::LevelDown),
            TokenKind::Load | TokenKind::LoadNum => Err(ParseError::semantic(
                format!(
                    "'{}' can only be the entire right-hand side of a declaration or assignment",
                    token.lexeme
                ),
                span,
            )),
            _ => Err(self.unexpected("Expected expression")),
        }
    }

    /// Zero or more `[index]` suffixes
    pub(crate) fn parse_index_list(&mut self) -> Result<Vec<Typed>, ParseError> {
        let mut indices = Vec::new();
        while self.match_token(TokenKind::LBracket) {
            self.skip_newlines();
            let index = self.parse_expression()?;
            self.check_index_type(&index)?;
            self.skip_newlines();
            self.expect_token(TokenKind::RBracket, "Expected ']' after index")?;
            indices.push(index);
        }
        Ok(indices)
    }

    pub(crate) fn check_index_type(&self, index: &Typed) -> Result<(), ParseError> {
        match index.ty {
            StaticType::Hp | StaticType::Numeric | StaticType::Unknown => Ok(()),
            other => Err(ParseError::semantic(
                format!("index must be hp, found {}", other),
                index.expr.span(),
            )),
        }
    }

    /// `[e1, e2, ...]`
    pub(crate) fn parse_bracket_list(&mut self) -> Result<Vec<Typed>, ParseError> {
        self.expect_token(TokenKind::LBracket, "Expected '['")?;
        self.skip_newlines();
        let mut items = Vec::new();
        if !self.check(TokenKind::RBracket) {
            loop {
                items.push(self.parse_expression()?);
                self.skip_newlines();
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
        }
        self.expect_token(TokenKind::RBracket, "Expected ']' to close the list")?;
        Ok(items)
    }

    /// What follows `name[...]`: a field, `drop`/`seek`, or a plain read
    pub(crate) fn parse_after_name(
        &mut self,
        name: String,
        name_span: SourceSpan,
        indices: Vec<Typed>,
    ) -> Result<Typed, ParseError> {
        if self.match_token(TokenKind::Dot) {
            return match self.peek_kind() {
                TokenKind::Drop => self.parse_drop(name, name_span, indices),
                TokenKind::Seek => self.parse_seek(name, name_span, indices),
                TokenKind::Join => Err(ParseError::semantic(
                    "'join' is a statement and has no value",
                    self.peek().span(),
                )),
                TokenKind::Identifier(_) if indices.is_empty() => {
                    let (field, field_span) = self.expect_identifier("")?;
                    self.field_read(name, field, name_span.to(field_span))
                }
                _ => Err(self.unexpected("Expected field name or array method after '.'")),
            };
        }

        let span = self.span_from(name_span.start);
        if indices.is_empty() {
            self.variable_read(name, span)
        } else {
            self.index_read(name, indices, span)
        }
    }

    /// A dead read is only certain when the binding is local to the body
    /// being parsed; globals may have been assigned by an earlier call.
    pub(super) fn dead_read_is_certain(&self, name: &str) -> bool {
        self.function.is_none() || !self.is_global_binding(name)
    }

    fn variable_read(&self, name: String, span: SourceSpan) -> Result<Typed, ParseError> {
        let ty = match self.lookup(&name, span)? {
            Binding::Variable(var) => match var.ty {
                VarType::Scalar(_) if var.value.is_dead() && self.dead_read_is_certain(&name) => {
                    StaticType::Dead
                }
                VarType::Scalar(ty) => StaticType::from_scalar(ty),
                VarType::Numeric => StaticType::Numeric,
                VarType::Untyped => StaticType::Unknown,
            },
            Binding::Array(_) => {
                return Err(ParseError::semantic(
                    format!("'{}' is an array; index it to read an element", name),
                    span,
                ))
            }
            Binding::StructInstance(_) => {
                return Err(ParseError::semantic(
                    format!("'{}' is a struct instance; read one of its fields", name),
                    span,
                ))
            }
            Binding::StructDef(_) => {
                return Err(ParseError::semantic(
                    format!("'{}' is a struct type, not a value", name),
                    span,
                ))
            }
            Binding::Function(_) => {
                return Err(ParseError::semantic(
                    format!("'{}' is a function; call it with '(...)'", name),
                    span,
                ))
            }
        };
        Ok(Typed::new(Expr::Variable { name, span }, ty))
    }

    fn index_read(
        &self,
        name: String,
        indices: Vec<Typed>,
        span: SourceSpan,
    ) -> Result<Typed, ParseError> {
        let ty = match self.lookup(&name, span)? {
            Binding::Array(arr) => {
                if indices.len() != arr.rank() {
                    return Err(ParseError::semantic(
                        format!(
                            "dimension mismatch: '{}' has {} dimension(s) but {} index(es) were given",
                            name,
                            arr.rank(),
                            indices.len()
                        ),
                        span,
                    ));
                }
                if arr.is_dead() && self.dead_read_is_certain(&name) {
                    return Err(ParseError::semantic(
                        format!("array '{}' is dead; redeclare it before use", name),
                        span,
                    ));
                }
                StaticType::from_scalar(arr.element_type)
            }
            Binding::Variable(var) if indices.len() == 1 => match var.ty {
                VarType::Scalar(ScalarType::Comms) => StaticType::Comms,
                VarType::Untyped => StaticType::Unknown,
                other => {
                    return Err(ParseError::semantic(
                        format!("'{}' is {}, not an array or comms", name, other),
                        span,
                    ))
                }
            },
            other => {
                return Err(ParseError::semantic(
                    format!("'{}' is a {} and cannot be indexed this way", name, other.kind_name()),
                    span,
                ))
            }
        };

        Ok(Typed::new(
            Expr::Index {
                name,
                indices: indices.into_iter().map(|t| t.expr).collect(),
                span,
            },
            ty,
        ))
    }

    fn field_read(
        &self,
        instance: String,
        field: String,
        span: SourceSpan,
    ) -> Result<Typed, ParseError> {
        let ty = self.field_type(&instance, &field, span)?;
        Ok(Typed::new(
            Expr::Field {
                instance,
                field,
                span,
            },
            StaticType::from_scalar(ty),
        ))
    }

    /// Declared type of `instance.field`
    pub(crate) fn field_type(
        &self,
        instance: &str,
        field: &str,
        span: SourceSpan,
    ) -> Result<ScalarType, ParseError> {
        match self.lookup(instance, span)? {
            Binding::StructInstance(inst) => inst
                .get(field)
                .and_then(|value| value.scalar_type())
                .ok_or_else(|| {
                    ParseError::semantic(
                        format!("'{}' ({}) has no field '{}'", instance, inst.parent, field),
                        span,
                    )
                }),
            other => Err(ParseError::semantic(
                format!("'{}' is a {}, not a struct instance", instance, other.kind_name()),
                span,
            )),
        }
    }

    /// Resolve `name` / `name[row]` as the target of an array built-in
    ///
    /// Returns the reference, the element type, and whether it names a whole
    /// 2-D array (so the operation works on rows).
    pub(crate) fn array_target(
        &self,
        name: String,
        name_span: SourceSpan,
        indices: Vec<Typed>,
        action: &str,
        mutating: bool,
    ) -> Result<(ArrayRef, ScalarType, bool), ParseError> {
        let span = self.span_from(name_span.start);
        let (rank, element_type, immutable) = match self.lookup(&name, name_span)? {
            Binding::Array(arr) => (arr.rank(), arr.element_type, arr.immutable),
            other => {
                return Err(ParseError::semantic(
                    format!("'{}' needs an array, but '{}' is a {}", action, name, other.kind_name()),
                    name_span,
                ))
            }
        };

        if mutating && immutable {
            return Err(ParseError::semantic(
                format!("cannot {} immutable array '{}'", action, name),
                span,
            ));
        }
        if indices.len() >= rank {
            return Err(ParseError::semantic(
                format!(
                    "'{}' works on a whole array or on one row of a 2-D array; '{}' has {} dimension(s)",
                    action, name, rank
                ),
                span,
            ));
        }

        let whole_grid = rank == 2 && indices.is_empty();
        let row = indices.into_iter().next().map(|t| Box::new(t.expr));
        Ok((ArrayRef { name, row, span }, element_type, whole_grid))
    }

    /// `a.drop()`, `a.drop(i)`, `m[i].drop()`, `m.drop()`
    pub(crate) fn parse_drop(
        &mut self,
        name: String,
        name_span: SourceSpan,
        indices: Vec<Typed>,
    ) -> Result<Typed, ParseError> {
        self.advance(); // drop
        let (array, element_type, whole_grid) =
            self.array_target(name, name_span, indices, "drop", true)?;

        self.expect_token(TokenKind::LParen, "Expected '(' after 'drop'")?;
        let index = if self.check(TokenKind::RParen) {
            None
        } else {
            let index = self.parse_expression()?;
            self.check_index_type(&index)?;
            Some(Box::new(index.expr))
        };
        self.expect_token(TokenKind::RParen, "Expected ')' after 'drop' argument")?;

        let span = self.span_from(name_span.start);
        let ty = if whole_grid {
            StaticType::Row(element_type)
        } else {
            StaticType::from_scalar(element_type)
        };
        Ok(Typed::new(Expr::Drop { array, index, span }, ty))
    }

    /// `a.seek(v)`, `m[i].seek(v)`, `m.seek([..])`
    fn parse_seek(
        &mut self,
        name: String,
        name_span: SourceSpan,
        indices: Vec<Typed>,
    ) -> Result<Typed, ParseError> {
        self.advance(); // seek
        let (array, element_type, whole_grid) =
            self.array_target(name, name_span, indices, "seek", false)?;

        self.expect_token(TokenKind::LParen, "Expected '(' after 'seek'")?;
        self.skip_newlines();
        let needle = if whole_grid {
            let row = self.parse_bracket_list()?;
            for item in &row {
                self.check_element(element_type, item, "seek row")?;
            }
            SeekNeedle::Row(row.into_iter().map(|t| t.expr).collect())
        } else {
            let value = self.parse_expression()?;
            self.check_element(element_type, &value, "seek value")?;
            SeekNeedle::Value(Box::new(value.expr))
        };
        self.skip_newlines();
        self.expect_token(TokenKind::RParen, "Expected ')' after 'seek' argument")?;

        let span = self.span_from(name_span.start);
        Ok(Typed::new(Expr::Seek { array, needle, span }, StaticType::Hp))
    }

    /// Value stored into (or compared with) an element of type `element_type`
    pub(crate) fn check_element(
        &self,
        element_type: ScalarType,
        value: &Typed,
        what: &str,
    ) -> Result<(), ParseError> {
        if value.ty == StaticType::Dead {
            return Err(ParseError::semantic(
                format!("{} cannot be dead", what),
                value.expr.span(),
            ));
        }
        if !assignable(element_type, value.ty) {
            return Err(ParseError::semantic(
                format!(
                    "type mismatch: {} of type {} expected, found {}",
                    what, element_type, value.ty
                ),
                value.expr.span(),
            ));
        }
        Ok(())
    }

    /// `name(args)`
    pub(crate) fn parse_call(
        &mut self,
        name: String,
        name_span: SourceSpan,
    ) -> Result<Typed, ParseError> {
        self.expect_token(TokenKind::LParen, "Expected '(' after function name")?;
        self.skip_newlines();
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                self.skip_newlines();
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
        }
        self.expect_token(TokenKind::RParen, "Expected ')' after arguments")?;
        let span = self.span_from(name_span.start);

        let (total, required, declared_arity) = match self.lookup(&name, name_span)? {
            Binding::Function(function) => (
                function.params.len(),
                function.required_params(),
                function.arity,
            ),
            other => {
                return Err(ParseError::semantic(
                    format!("'{}' is a {}, not a function", name, other.kind_name()),
                    name_span,
                ))
            }
        };

        if args.len() < required || args.len() > total {
            let expected = if required == total {
                format!("{}", total)
            } else {
                format!("{} to {}", required, total)
            };
            return Err(ParseError::semantic(
                format!(
                    "function '{}' expects {} argument(s), found {}",
                    name,
                    expected,
                    args.len()
                ),
                span,
            ));
        }

        // a recursive call sees the arity recorded so far in its own body
        let arity = match &self.function {
            Some(ctx) if ctx.name == name => ctx.arity,
            _ => declared_arity,
        };
        let ty = match arity {
            None | Some(1) => StaticType::Unknown,
            Some(0) => StaticType::Void,
            Some(n) => StaticType::Multi(n),
        };

        Ok(Typed::new(
            Expr::Call {
                name,
                args: args.into_iter().map(|t| t.expr).collect(),
                span,
            },
            ty,
        ))
    }

    /// `rounds(x)`: length of a comms value, an array, or one row
    fn parse_rounds(&mut self) -> Result<Typed, ParseError> {
        let start = self.current_location();
        self.advance();
        self.expect_token(TokenKind::LParen, "Expected '(' after 'rounds'")?;
        self.skip_newlines();

        let names_array = self.peek().is_identifier()
            && self.peek_nth(1).kind != TokenKind::LParen
            && matches!(self.env.lookup(&self.peek().lexeme), Ok(Binding::Array(_)));

        let target = if names_array {
            let (name, name_span) = self.expect_identifier("")?;
            let indices = self.parse_index_list()?;
            let (array, _, _) = self.array_target(name, name_span, indices, "rounds", false)?;
            RoundsTarget::Array(array)
        } else {
            let value = self.parse_expression()?;
            if value.ty.is_known() && value.ty != StaticType::Comms {
                return Err(ParseError::semantic(
                    format!("'rounds' needs comms or an array, found {}", value.ty),
                    value.expr.span(),
                ));
            }
            RoundsTarget::Value(Box::new(value.expr))
        };

        self.skip_newlines();
        self.expect_token(TokenKind::RParen, "Expected ')' after 'rounds' argument")?;
        Ok(Typed::new(
            Expr::Rounds {
                target,
                span: self.span_from(start),
            },
            StaticType::Hp,
        ))
    }

    /// `toHp(e)`, `toXp(e)`, `toComms(e)`, `levelUp(s)`, `levelDown(s)`
    fn parse_conversion(&mut self, conversion: Conversion) -> Result<Typed, ParseError> {
        let start = self.current_location();
        self.advance();
        self.expect_token(
            TokenKind::LParen,
            &format!("Expected '(' after '{}'", conversion.name()),
        )?;
        self.skip_newlines();
        let operand = self.parse_expression()?;
        self.skip_newlines();
        self.expect_token(
            TokenKind::RParen,
            &format!("Expected ')' after '{}' argument", conversion.name()),
        )?;
        let span = self.span_from(start);

        if operand.ty == StaticType::Dead {
            return Err(ParseError::semantic(
                format!("'{}' cannot convert a dead value", conversion.name()),
                span,
            ));
        }

        let ty = match conversion {
            Conversion::LevelUp | Conversion::LevelDown => {
                if operand.ty.is_known() && operand.ty != StaticType::Comms {
                    return Err(ParseError::semantic(
                        format!("'{}' needs comms, found {}", conversion.name(), operand.ty),
                        span,
                    ));
                }
                StaticType::Comms
            }
            Conversion::ToHp => StaticType::Hp,
            Conversion::ToXp => StaticType::Xp,
            Conversion::ToComms => StaticType::Comms,
        };

        Ok(Typed::new(
            Expr::Convert {
                conversion,
                operand: Box::new(operand.expr),
                span,
            },
            ty,
        ))
    }

    /// Build `left op right`, applying the static typing rules
    fn binary(&self, op: BinOp, left: Typed, right: Typed) -> Result<Typed, ParseError> {
        self.expect_single_value(&left)?;
        self.expect_single_value(&right)?;
        let span = left.expr.span().to(right.expr.span());
        let ty = binary_type(op, left.ty, right.ty)
            .map_err(|message| ParseError::semantic(message, span))?;

        Ok(Typed::new(
            Expr::Binary {
                op,
                left: Box::new(left.expr),
                right: Box::new(right.expr),
                span,
            },
            ty,
        ))
    }
}

fn describe_call(expr: &Expr) -> String {
    match expr {
        Expr::Call { name, .. } => format!("function '{}'", name),
        _ => "this expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::lexer::tokenize;
    use crate::parser::parse::{ParseError, ParseErrorKind, Parser};

    fn parse(source: &str) -> Result<Program, ParseError> {
        let out = tokenize(source);
        assert!(out.is_clean(), "lexer diagnostics: {:?}", out.diagnostics);
        Parser::new(out.tokens).parse_program()
    }

    /// Initializer expression of the first global declaration
    fn first_init(source: &str) -> Expr {
        let program = parse(source).unwrap();
        match &program.items[0] {
            Stmt::VarDecl {
                init: VarInit::Shared(Rhs::Expr(expr)),
                ..
            } => expr.clone(),
            other => panic!("expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_subtraction_and_negative_literal() {
        for source in ["hp a: 1\nhp b: a-1\nplay() {\n}", "hp a: 1\nhp b: a - 1\nplay() {\n}"] {
            let program = parse(source).unwrap();
            match &program.items[1] {
                Stmt::VarDecl {
                    init: VarInit::Shared(Rhs::Expr(Expr::Binary { op, .. })),
                    ..
                } => assert_eq!(*op, BinOp::Sub),
                other => panic!("expected subtraction, got {:?}", other),
            }
        }

        assert!(matches!(
            first_init("hp b: -1\nplay() {\n}"),
            Expr::HpLiteral(-1, _)
        ));
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match first_init("hp x: 1 + 2 * 3\nplay() {\n}") {
            Expr::Binary {
                op: BinOp::Add,
                right,
                ..
            } => assert!(matches!(*right, Expr::Binary { op: BinOp::Mul, .. })),
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_exponent_is_right_associative() {
        match first_init("xp x: 2 ^ 3 ^ 2\nplay() {\n}") {
            Expr::Binary {
                op: BinOp::Pow,
                left,
                right,
                ..
            } => {
                assert!(matches!(*left, Expr::HpLiteral(2, _)));
                assert!(matches!(*right, Expr::Binary { op: BinOp::Pow, .. }));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_relational_chain() {
        match first_init("flag f: 1 < 2 < 3\nplay() {\n}") {
            Expr::Chain { operands, ops, .. } => {
                assert_eq!(operands.len(), 3);
                assert_eq!(ops, vec![BinOp::Lt, BinOp::Lt]);
            }
            other => panic!("expected chain, got {:?}", other),
        }
    }

    #[test]
    fn test_type_mismatch_is_semantic() {
        let err = parse("hp x: \"text\"\nplay() {\n}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Semantic);
        let err = parse("flag f: \"a\" < \"b\"\nplay() {\n}").unwrap_err();
        assert!(err.message.contains("comms"), "{}", err.message);
    }

    #[test]
    fn test_load_inside_expression_is_rejected() {
        let err = parse("play() {\n\thp x: 1 + loadNum(\"n\")\n}").unwrap_err();
        assert!(err.message.contains("right-hand side"), "{}", err.message);
    }

    #[test]
    fn test_dimension_count_is_checked() {
        let err = parse("hp m[2][2]: [[1, 2], [3, 4]]\nhp x: m[0]\nplay() {\n}").unwrap_err();
        assert!(err.message.contains("dimension mismatch"), "{}", err.message);
    }

    #[test]
    fn test_format_suffix_needs_a_number() {
        assert!(parse("xp v: 2.5\ncomms s: v.2f\nplay() {\n}").is_ok());
        assert!(parse("comms t: \"a\"\ncomms s: t.2f\nplay() {\n}").is_err());
    }
}
