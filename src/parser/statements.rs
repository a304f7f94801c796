//! Statement parsing implementation
//!
//! Dispatches on the leading token of a statement. Declarations live in
//! `declarations`, everything else is handled here: assignments, control
//! flow, `recall`, output and the array `join` statement.

use crate::environment::{Binding, Value, VarType, Variable};
use crate::parser::ast::*;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::semantics::{assignable, binary_type, StaticType, Typed};
use crate::parser::token::TokenKind;

impl Parser {
    /// Parse one statement (without its terminating newline)
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let token = self.peek().clone();
        let span = token.span();

        match token.kind {
            TokenKind::Hp
            | TokenKind::Xp
            | TokenKind::Comms
            | TokenKind::Flag
            | TokenKind::Immo
            | TokenKind::Access => self.parse_declaration(),
            TokenKind::Build => self.parse_struct_definition(),
            TokenKind::If => {
                self.reject_at_global("'if'", span)?;
                self.parse_if()
            }
            TokenKind::Flank => {
                self.reject_at_global("'flank'", span)?;
                self.parse_flank()
            }
            TokenKind::For => {
                self.reject_at_global("'for'", span)?;
                self.parse_for()
            }
            TokenKind::While => {
                self.reject_at_global("'while'", span)?;
                self.parse_while()
            }
            TokenKind::Grind => {
                self.reject_at_global("'grind'", span)?;
                self.parse_grind()
            }
            TokenKind::Checkpoint | TokenKind::Resume => {
                self.reject_at_global(&format!("'{}'", token.lexeme), span)?;
                if self.loop_depth == 0 {
                    return Err(ParseError::semantic(
                        format!("'{}' can only be used inside a loop", token.lexeme),
                        span,
                    ));
                }
                self.advance();
                Ok(if token.kind == TokenKind::Checkpoint {
                    Stmt::Checkpoint(span)
                } else {
                    Stmt::Resume(span)
                })
            }
            TokenKind::Recall => self.parse_recall(),
            TokenKind::Shoot | TokenKind::ShootNxt => {
                self.reject_at_global("output", span)?;
                self.parse_shoot()
            }
            TokenKind::Identifier(_) => self.parse_identifier_statement(),
            TokenKind::Play => Err(ParseError::semantic(
                "play() can only appear once, as the last global item",
                span,
            )),
            _ => Err(self.unexpected("Expected a statement")),
        }
    }

    /// Condition of `if`/`elif`/`while`/`for`/`grind`: must be a flag
    fn parse_condition(&mut self, keyword: &str) -> Result<Expr, ParseError> {
        let condition = self.parse_expression()?;
        if condition.ty.is_known() && condition.ty != StaticType::Flag {
            return Err(ParseError::semantic(
                format!("'{}' condition must be flag, found {}", keyword, condition.ty),
                condition.expr.span(),
            ));
        }
        Ok(condition.expr)
    }

    /// `if cond { } elif cond { } else { }`
    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        self.advance(); // if

        let mut branches = Vec::new();
        let condition = self.parse_condition("if")?;
        let body = self.parse_scoped_block("if block")?;
        branches.push((condition, body));

        let mut else_branch = None;
        loop {
            match self.peek_past_newlines() {
                TokenKind::Elif => {
                    self.skip_newlines();
                    self.advance();
                    let condition = self.parse_condition("elif")?;
                    let body = self.parse_scoped_block("elif block")?;
                    branches.push((condition, body));
                }
                TokenKind::Else => {
                    self.skip_newlines();
                    self.advance();
                    else_branch = Some(self.parse_scoped_block("else block")?);
                    break;
                }
                _ => break,
            }
        }

        Ok(Stmt::If {
            branches,
            else_branch,
            span: self.span_from(start),
        })
    }

    /// `flank subject { choice v, w: ... backup: ... }`
    fn parse_flank(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        self.advance(); // flank
        let subject = self.parse_expression()?;
        if subject.ty == StaticType::Dead {
            return Err(ParseError::semantic(
                "'flank' cannot switch on a dead value",
                subject.expr.span(),
            ));
        }
        self.expect_token(TokenKind::LBrace, "Expected '{' after flank subject")?;
        self.skip_newlines();

        let mut arms = Vec::new();
        let mut backup: Option<Vec<Stmt>> = None;
        loop {
            match self.peek_kind() {
                TokenKind::Choice => {
                    let arm_start = self.current_location();
                    if backup.is_some() {
                        return Err(ParseError::semantic(
                            "'choice' cannot follow 'backup'",
                            self.peek().span(),
                        ));
                    }
                    self.advance();
                    let mut values = Vec::new();
                    loop {
                        let value = self.parse_expression()?;
                        binary_type(BinOp::Eq, subject.ty, value.ty).map_err(|message| {
                            ParseError::semantic(
                                format!("choice value does not match the flank subject: {}", message),
                                value.expr.span(),
                            )
                        })?;
                        values.push(value.expr);
                        if !self.match_token(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect_token(TokenKind::Colon, "Expected ':' after choice values")?;
                    let body = self.parse_arm_body("choice")?;
                    arms.push(ChoiceArm {
                        values,
                        body,
                        span: self.span_from(arm_start),
                    });
                }
                TokenKind::Backup => {
                    if backup.is_some() {
                        return Err(ParseError::semantic(
                            "'flank' has more than one 'backup'",
                            self.peek().span(),
                        ));
                    }
                    self.advance();
                    self.expect_token(TokenKind::Colon, "Expected ':' after 'backup'")?;
                    backup = Some(self.parse_arm_body("backup")?);
                }
                TokenKind::RBrace => break,
                _ => return Err(self.unexpected("Expected 'choice', 'backup' or '}' in flank")),
            }
        }
        self.expect_token(TokenKind::RBrace, "Expected '}' to close flank")?;
        let span = self.span_from(start);

        let Some(backup) = backup else {
            return Err(ParseError::semantic("'flank' needs a 'backup' arm", span));
        };
        Ok(Stmt::Flank {
            subject: subject.expr,
            arms,
            backup,
            span,
        })
    }

    /// Statements of one flank arm, up to the next arm or the closing brace
    fn parse_arm_body(&mut self, label: &str) -> Result<Vec<Stmt>, ParseError> {
        self.env.enter_scope(label);
        self.skip_newlines();
        let mut body = Vec::new();
        while !matches!(
            self.peek_kind(),
            TokenKind::Choice | TokenKind::Backup | TokenKind::RBrace | TokenKind::Eof
        ) {
            body.push(self.parse_statement()?);
            self.end_statement()?;
        }
        self.env.exit_scope(true);
        Ok(body)
    }

    /// `for i: start, condition, update { body }`
    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        self.advance(); // for
        let (counter, counter_span) = self.expect_identifier("as loop counter")?;
        self.expect_token(TokenKind::Colon, "Expected ':' after loop counter")?;
        let init = self.parse_expression()?;
        self.check_element(ScalarType::Hp, &init, "loop counter")?;
        self.expect_token(TokenKind::Comma, "Expected ',' after loop start value")?;

        self.env.enter_scope("for");
        self.declare(
            &counter,
            Binding::Variable(Variable::new(
                VarType::Scalar(ScalarType::Hp),
                Value::Hp(0),
                false,
            )),
            counter_span,
        )?;

        let condition = self.parse_condition("for")?;
        self.expect_token(TokenKind::Comma, "Expected ',' after loop condition")?;

        let update_start = self.current_location();
        let (target, target_span) = self.expect_identifier("in loop update")?;
        if target != counter {
            return Err(ParseError::semantic(
                format!("the loop update must assign to the counter '{}'", counter),
                target_span,
            ));
        }
        let Some(op) = self.assign_op() else {
            return Err(self.unexpected("Expected an assignment in the loop update"));
        };
        self.advance();
        let value = self.parse_expression()?;
        self.check_slot(&target, VarType::Scalar(ScalarType::Hp), op, &value)?;
        let update = Stmt::Assign {
            target: AssignTarget::Variable(target),
            op,
            value: Rhs::Expr(value.expr),
            span: self.span_from(update_start),
        };

        self.loop_depth += 1;
        let body = self.parse_scoped_block("for body");
        self.loop_depth -= 1;
        self.env.exit_scope(true);

        Ok(Stmt::For {
            counter,
            start: init.expr,
            condition,
            update: Box::new(update),
            body: body?,
            span: self.span_from(start),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        self.advance(); // while
        let condition = self.parse_condition("while")?;
        self.loop_depth += 1;
        let body = self.parse_scoped_block("while body");
        self.loop_depth -= 1;
        Ok(Stmt::While {
            condition,
            body: body?,
            span: self.span_from(start),
        })
    }

    /// `grind { body } while condition`
    fn parse_grind(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        self.advance(); // grind
        self.loop_depth += 1;
        let body = self.parse_scoped_block("grind body");
        self.loop_depth -= 1;
        let body = body?;

        if self.peek_past_newlines() == TokenKind::While {
            self.skip_newlines();
        }
        self.expect_token(TokenKind::While, "Expected 'while' after grind body")?;
        let condition = self.parse_condition("grind")?;

        Ok(Stmt::Grind {
            body,
            condition,
            span: self.span_from(start),
        })
    }

    /// `recall` / `recall v1, v2, ...`
    fn parse_recall(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        let keyword = self.advance();
        let Some(name) = self.function.as_ref().map(|ctx| ctx.name.clone()) else {
            return Err(ParseError::semantic(
                "'recall' can only be used inside a function",
                keyword.span(),
            ));
        };

        let mut values = Vec::new();
        if !matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::RBrace | TokenKind::Eof
        ) {
            loop {
                values.push(self.parse_expression()?.expr);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        let span = self.span_from(start);

        let count = values.len();
        if let Some(ctx) = self.function.as_mut() {
            match ctx.arity {
                None => ctx.arity = Some(count),
                Some(expected) if expected != count => {
                    return Err(ParseError::semantic(
                        format!(
                            "function '{}' recalls {} value(s) elsewhere but {} here",
                            name, expected, count
                        ),
                        span,
                    ))
                }
                Some(_) => {}
            }
        }

        Ok(Stmt::Recall { values, span })
    }

    /// `shoot(e)` / `shootNxt(e)`
    fn parse_shoot(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        let keyword = self.advance();
        let newline = keyword.kind == TokenKind::ShootNxt;

        self.expect_token(
            TokenKind::LParen,
            &format!("Expected '(' after '{}'", keyword.lexeme),
        )?;
        self.skip_newlines();
        let value = if newline && self.check(TokenKind::RParen) {
            Expr::CommsLiteral(String::new(), keyword.span())
        } else {
            self.parse_expression()?.expr
        };
        self.skip_newlines();
        self.expect_token(
            TokenKind::RParen,
            &format!("Expected ')' after '{}' argument", keyword.lexeme),
        )?;

        Ok(Stmt::Shoot {
            value,
            newline,
            span: self.span_from(start),
        })
    }

    fn assign_op(&self) -> Option<AssignOp> {
        match self.peek_kind() {
            TokenKind::Colon => Some(AssignOp::Set),
            TokenKind::PlusEq => Some(AssignOp::Add),
            TokenKind::MinusEq => Some(AssignOp::Sub),
            TokenKind::StarEq => Some(AssignOp::Mul),
            TokenKind::SlashEq => Some(AssignOp::Div),
            TokenKind::PercentEq => Some(AssignOp::Mod),
            _ => None,
        }
    }

    /// Statement starting with a name: call, assignment, `join`, `drop`, `seek`
    fn parse_identifier_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        let (name, name_span) = self.expect_identifier("")?;

        if self.check(TokenKind::LParen) {
            let call = self.parse_call(name, name_span)?;
            return Ok(Stmt::Expr(call.expr));
        }

        let indices = self.parse_index_list()?;

        if self.check(TokenKind::Dot) {
            match self.peek_nth(1).kind {
                TokenKind::Join => {
                    self.advance(); // .
                    return self.parse_join(start, name, name_span, indices);
                }
                TokenKind::Drop | TokenKind::Seek => {
                    let value = self.parse_after_name(name, name_span, indices)?;
                    return Ok(Stmt::Expr(value.expr));
                }
                _ => {}
            }
        }

        let (target, slot) = if self.match_token(TokenKind::Dot) {
            let (field, field_span) = self.expect_identifier("as field name")?;
            if !indices.is_empty() {
                return Err(ParseError::semantic(
                    format!("'{}' cannot be indexed", name),
                    name_span.to(field_span),
                ));
            }
            let slot = self.field_slot(&name, &field, name_span.to(field_span))?;
            (AssignTarget::Field { instance: name, field }, slot)
        } else {
            self.indexed_slot(name, name_span, indices)?
        };

        let Some(op) = self.assign_op() else {
            return Err(self.unexpected("Expected ':' or a compound assignment"));
        };
        self.advance();
        self.parse_assignment(start, target, slot, op)
    }

    /// Target and declared type of `name` / `name[i]` / `name[i][j]`
    fn indexed_slot(
        &self,
        name: String,
        name_span: SourceSpan,
        indices: Vec<Typed>,
    ) -> Result<(AssignTarget, VarType), ParseError> {
        let span = self.span_from(name_span.start);
        match self.lookup(&name, name_span)? {
            Binding::Variable(var) => {
                if var.immutable {
                    return Err(ParseError::semantic(
                        format!("cannot assign to immutable '{}'", name),
                        span,
                    ));
                }
                if var.value.is_dead() && self.dead_read_is_certain(&name) {
                    return Err(ParseError::semantic(
                        format!("'{}' is dead; redeclare it before assigning to it", name),
                        span,
                    ));
                }
                match (indices.len(), var.ty) {
                    (0, ty) => Ok((AssignTarget::Variable(name), ty)),
                    (1, VarType::Scalar(ScalarType::Comms) | VarType::Untyped) => {
                        let index = indices.into_iter().next().map(|t| Box::new(t.expr));
                        match index {
                            Some(index) => Ok((
                                AssignTarget::CommsChar { name, index },
                                VarType::Scalar(ScalarType::Comms),
                            )),
                            None => Err(ParseError::semantic("missing index", span)),
                        }
                    }
                    (_, ty) => Err(ParseError::semantic(
                        format!("'{}' is {} and cannot be indexed", name, ty),
                        span,
                    )),
                }
            }
            Binding::Array(arr) => {
                if indices.is_empty() {
                    return Err(ParseError::semantic(
                        format!("cannot assign to array '{}' as a whole; assign its elements", name),
                        span,
                    ));
                }
                if arr.immutable {
                    return Err(ParseError::semantic(
                        format!("cannot assign to immutable array '{}'", name),
                        span,
                    ));
                }
                if arr.is_dead() && self.dead_read_is_certain(&name) {
                    return Err(ParseError::semantic(
                        format!("array '{}' is dead; redeclare it before use", name),
                        span,
                    ));
                }
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
                let ty = VarType::Scalar(arr.element_type);
                Ok((
                    AssignTarget::Element {
                        name,
                        indices: indices.into_iter().map(|t| t.expr).collect(),
                    },
                    ty,
                ))
            }
            other => Err(ParseError::semantic(
                format!("cannot assign to {} '{}'", other.kind_name(), name),
                span,
            )),
        }
    }

    fn field_slot(&self, instance: &str, field: &str, span: SourceSpan) -> Result<VarType, ParseError> {
        if let Binding::StructInstance(inst) = self.lookup(instance, span)? {
            if inst.immutable {
                return Err(ParseError::semantic(
                    format!("cannot assign to a field of immutable '{}'", instance),
                    span,
                ));
            }
        }
        Ok(VarType::Scalar(self.field_type(instance, field, span)?))
    }

    fn parse_assignment(
        &mut self,
        start: SourceLocation,
        target: AssignTarget,
        slot: VarType,
        op: AssignOp,
    ) -> Result<Stmt, ParseError> {
        let target_name = target.root_name().to_string();
        if matches!(target, AssignTarget::CommsChar { .. }) && op != AssignOp::Set {
            return Err(ParseError::semantic(
                "a single character can only be replaced with ':'",
                self.span_from(start),
            ));
        }

        let value = if matches!(self.peek_kind(), TokenKind::Load | TokenKind::LoadNum) {
            if op != AssignOp::Set {
                return Err(ParseError::semantic(
                    "input cannot be combined with a compound assignment",
                    self.peek().span(),
                ));
            }
            let (rhs, ty) = self.parse_input_rhs()?;
            let placeholder = Typed::new(Expr::Dead(rhs.span()), ty);
            self.check_slot(&target_name, slot, op, &placeholder)?;
            rhs
        } else {
            let value = self.parse_expression()?;
            self.check_slot(&target_name, slot, op, &value)?;
            Rhs::Expr(value.expr)
        };

        Ok(Stmt::Assign {
            target,
            op,
            value,
            span: self.span_from(start),
        })
    }

    /// Type check `target op value` against the slot's declared type
    fn check_slot(
        &self,
        target: &str,
        slot: VarType,
        op: AssignOp,
        value: &Typed,
    ) -> Result<(), ParseError> {
        let span = value.expr.span();
        let ty = match slot {
            VarType::Scalar(ty) => ty,
            VarType::Numeric => {
                if value.ty.is_known() && !value.ty.is_numeric() && value.ty != StaticType::Dead {
                    return Err(ParseError::semantic(
                        format!("type mismatch: '{}' holds a number, found {}", target, value.ty),
                        span,
                    ));
                }
                return Ok(());
            }
            VarType::Untyped => return Ok(()),
        };

        let stored = match op.binary_op() {
            Some(bin) => binary_type(bin, StaticType::from_scalar(ty), value.ty)
                .map_err(|message| ParseError::semantic(message, span))?,
            None => value.ty,
        };
        if !assignable(ty, stored) {
            return Err(ParseError::semantic(
                format!("type mismatch: cannot assign {} to {} '{}'", stored, ty, target),
                span,
            ));
        }
        Ok(())
    }

    /// `a.join(v)`, `m[i].join(v)`, `m.join([row])`
    fn parse_join(
        &mut self,
        start: SourceLocation,
        name: String,
        name_span: SourceSpan,
        indices: Vec<Typed>,
    ) -> Result<Stmt, ParseError> {
        self.advance(); // join
        let (array, element_type, whole_grid) =
            self.array_target(name, name_span, indices, "join", true)?;

        self.expect_token(TokenKind::LParen, "Expected '(' after 'join'")?;
        self.skip_newlines();
        let value = if whole_grid {
            let row = self.parse_bracket_list()?;
            for item in &row {
                self.check_element(element_type, item, "joined element")?;
            }
            JoinValue::Row(row.into_iter().map(|t| t.expr).collect())
        } else {
            let value = self.parse_expression()?;
            self.check_element(element_type, &value, "joined element")?;
            JoinValue::Scalar(value.expr)
        };
        self.skip_newlines();
        self.expect_token(TokenKind::RParen, "Expected ')' after 'join' argument")?;

        Ok(Stmt::Join {
            array,
            value,
            span: self.span_from(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::lexer::tokenize;
    use crate::parser::parse::{ParseError, ParseErrorKind, Parser};
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Program, ParseError> {
        let out = tokenize(source);
        assert!(out.is_clean(), "lexer diagnostics: {:?}", out.diagnostics);
        Parser::new(out.tokens).parse_program()
    }

    fn play_body(source: &str) -> Vec<Stmt> {
        let program = parse(source).unwrap();
        match program.items.into_iter().last() {
            Some(Stmt::Play { body, .. }) => body,
            other => panic!("expected play block, got {:?}", other),
        }
    }

    #[test]
    fn test_if_elif_else_chain() {
        let body = play_body(
            "hp x: 3\nplay() {\n\tif x > 5 {\n\t\tshoot(1)\n\t}\n\telif x > 2 {\n\t\tshoot(2)\n\t}\n\telse {\n\t\tshoot(3)\n\t}\n}",
        );
        match &body[0] {
            Stmt::If {
                branches,
                else_branch,
                ..
            } => {
                assert_eq!(branches.len(), 2);
                assert!(else_branch.is_some());
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_condition_must_be_flag() {
        let err = parse("play() {\n\tif 1 {\n\t}\n}").unwrap_err();
        assert!(err.message.contains("must be flag"), "{}", err.message);
    }

    #[test]
    fn test_for_loop_update_must_touch_counter() {
        assert!(parse("play() {\n\tfor i: 0, i < 3, i += 1 {\n\t\tshoot(i)\n\t}\n}").is_ok());
        let err = parse("hp j: 0\nplay() {\n\tfor i: 0, i < 3, j += 1 {\n\t}\n}").unwrap_err();
        assert!(err.message.contains("counter 'i'"), "{}", err.message);
    }

    #[test]
    fn test_loop_counter_is_scoped_to_the_loop() {
        let err = parse("play() {\n\tfor i: 0, i < 3, i += 1 {\n\t}\n\tshoot(i)\n}").unwrap_err();
        assert!(err.message.contains("not declared"), "{}", err.message);
    }

    #[test]
    fn test_checkpoint_outside_loop() {
        let err = parse("play() {\n\tcheckpoint\n}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Semantic);
        assert!(parse("play() {\n\twhile true {\n\t\tcheckpoint\n\t}\n}").is_ok());
    }

    #[test]
    fn test_grind_with_trailing_while() {
        let body = play_body("hp n: 0\nplay() {\n\tgrind {\n\t\tn += 1\n\t}\n\twhile n < 3\n}");
        assert!(matches!(body[0], Stmt::Grind { .. }));
    }

    #[test]
    fn test_flank_requires_backup_last() {
        let ok = "hp n: 2\nplay() {\n\tflank n {\n\t\tchoice 1, 2: shoot(\"low\")\n\t\tchoice 3:\n\t\t\tshoot(\"three\")\n\t\tbackup: shoot(\"other\")\n\t}\n}";
        let body = play_body(ok);
        match &body[0] {
            Stmt::Flank { arms, backup, .. } => {
                assert_eq!(arms.len(), 2);
                assert_eq!(arms[0].values.len(), 2);
                assert_eq!(backup.len(), 1);
            }
            other => panic!("expected flank, got {:?}", other),
        }

        let missing = "hp n: 2\nplay() {\n\tflank n {\n\t\tchoice 1: shoot(1)\n\t}\n}";
        assert!(parse(missing).unwrap_err().message.contains("backup"));

        let late = "hp n: 2\nplay() {\n\tflank n {\n\t\tbackup: shoot(0)\n\t\tchoice 1: shoot(1)\n\t}\n}";
        assert!(parse(late).is_err());
    }

    #[test]
    fn test_choice_values_match_subject() {
        let source = "hp n: 2\nplay() {\n\tflank n {\n\t\tchoice \"a\": shoot(1)\n\t\tbackup: shoot(0)\n\t}\n}";
        assert!(parse(source).is_err());
    }

    #[test]
    fn test_immutable_assignment_is_rejected() {
        let err = parse("immo hp k: 10\nplay() {\n\tk: 5\n}").unwrap_err();
        assert!(err.message.contains("immutable"), "{}", err.message);
        let err = parse("immo hp a[]: [1]\nplay() {\n\ta.join(2)\n}").unwrap_err();
        assert!(err.message.contains("immutable"), "{}", err.message);
    }

    #[test]
    fn test_compound_assignment_types() {
        assert!(parse("xp v: 1.0\nplay() {\n\tv += 2\n}").is_ok());
        assert!(parse("hp v: 1\nplay() {\n\tv += 2.5\n}").is_err());
        assert!(parse("comms s: \"a\"\nplay() {\n\ts += \"b\"\n\ts -= \"b\"\n}").is_err());
    }

    #[test]
    fn test_recall_arity_must_be_consistent() {
        let source = "f(a) {\n\tif a > 0 {\n\t\trecall 1\n\t}\n\trecall 1, 2\n}\nplay() {\n}";
        let err = parse(source).unwrap_err();
        assert!(err.message.contains("elsewhere"), "{}", err.message);
    }

    #[test]
    fn test_recall_outside_function() {
        assert!(parse("play() {\n\trecall 1\n}").is_err());
    }

    #[test]
    fn test_dead_variable_read_is_caught() {
        let err = parse("play() {\n\thp x: dead\n\tshoot(x + 1)\n}").unwrap_err();
        assert!(err.message.contains("dead"), "{}", err.message);
        assert!(parse("play() {\n\thp x: dead\n\thp x: 2\n\tshoot(x + 1)\n}").is_ok());
    }

    #[test]
    fn test_dead_variable_needs_redeclaration_before_assignment() {
        let err = parse("play() {\n\thp x: dead\n\tx: 1\n}").unwrap_err();
        assert!(err.message.contains("redeclare"), "{}", err.message);
        assert_eq!(err.span.start.line, 3);

        // a branch cannot revive it for the rest of the block either
        let source = "play() {\n\tcomms s: dead\n\tif true {\n\t\ts: \"a\"\n\t}\n\tshoot(s)\n}";
        assert!(parse(source).is_err());

        assert!(parse("play() {\n\thp a[2]: dead\n\ta[0]: 1\n}").is_err());
    }

    #[test]
    fn test_join_drop_and_seek_statements() {
        let body = play_body(
            "hp a[]: [1, 2]\nhp m[][]: [[1], [2]]\nplay() {\n\ta.join(3)\n\tm.join([4])\n\ta.drop()\n\tm[0].seek(1)\n}",
        );
        assert!(matches!(body[0], Stmt::Join { value: JoinValue::Scalar(_), .. }));
        assert!(matches!(body[1], Stmt::Join { value: JoinValue::Row(_), .. }));
        assert!(matches!(body[2], Stmt::Expr(Expr::Drop { .. })));
        assert!(matches!(body[3], Stmt::Expr(Expr::Seek { .. })));
    }

    #[test]
    fn test_expression_statement_must_have_effect() {
        assert!(parse("hp x: 1\nplay() {\n\tx\n}").is_err());
    }
}
