//! Declaration parsing
//!
//! Handles every construct that introduces a name:
//!
//! ```text
//! var_decl    ::= ["immo"] type name ("," name)* [":" init]
//! array_decl  ::= ["immo"] type name dim dim? [":" array_init]
//! struct_def  ::= "build" Name "{" field ("," field)* "}"
//! instance    ::= ["immo"] "access" Name name [":" expr ("," expr)*]
//! function    ::= name "(" [param ("," param)*] ")" block
//! ```
//!
//! Each declaration is checked against the parser's environment and then
//! registered in it, so later statements see the name.

use crate::environment::{
    ArrayBinding, ArrayElements, Binding, FieldDef, Function, NumericHint, StructDef,
    StructInstance, Value, VarType, Variable,
};
use crate::parser::ast::*;
use crate::parser::parse::{FunctionContext, ParseError, Parser};
use crate::parser::semantics::{assignable, StaticType, Typed};
use crate::parser::token::TokenKind;
use std::rc::Rc;

pub(crate) fn scalar_type_of(kind: TokenKind) -> Option<ScalarType> {
    match kind {
        TokenKind::Hp => Some(ScalarType::Hp),
        TokenKind::Xp => Some(ScalarType::Xp),
        TokenKind::Comms => Some(ScalarType::Comms),
        TokenKind::Flag => Some(ScalarType::Flag),
        _ => None,
    }
}

impl Parser {
    /// Variable, array or struct-instance declaration, with optional `immo`
    pub(crate) fn parse_declaration(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        let immutable = self.match_token(TokenKind::Immo);

        if self.check(TokenKind::Access) {
            return self.parse_struct_instance(start, immutable);
        }

        let Some(var_type) = scalar_type_of(self.peek_kind()) else {
            return Err(self.unexpected("Expected a type after 'immo'"));
        };
        self.advance();
        let (name, name_span) = self.expect_identifier("in declaration")?;

        if self.check(TokenKind::LBracket) {
            return self.parse_array_declaration(start, var_type, name, name_span, immutable);
        }

        let mut names = vec![(name, name_span)];
        while self.match_token(TokenKind::Comma) {
            names.push(self.expect_identifier("after ','")?);
        }

        let init = if self.match_token(TokenKind::Colon) {
            self.parse_var_init(var_type, &names, immutable)?
        } else {
            if immutable {
                return Err(ParseError::semantic(
                    format!("immutable '{}' needs an initializer", names[0].0),
                    self.span_from(start),
                ));
            }
            VarInit::Default
        };
        let span = self.span_from(start);

        for (i, (name, name_span)) in names.iter().enumerate() {
            let dead = match &init {
                VarInit::Dead => true,
                VarInit::Each(values) => matches!(values.get(i), Some(Expr::Dead(_))),
                _ => false,
            };
            let value = if dead {
                Value::Dead
            } else {
                Value::default_for(var_type)
            };
            self.declare(
                name,
                Binding::Variable(Variable::new(VarType::Scalar(var_type), value, immutable)),
                *name_span,
            )?;
        }

        Ok(Stmt::VarDecl {
            var_type,
            names: names.into_iter().map(|(name, _)| name).collect(),
            init,
            immutable,
            span,
        })
    }

    /// Everything after `name, name:` in a scalar declaration
    fn parse_var_init(
        &mut self,
        var_type: ScalarType,
        names: &[(String, SourceSpan)],
        immutable: bool,
    ) -> Result<VarInit, ParseError> {
        if matches!(self.peek_kind(), TokenKind::Load | TokenKind::LoadNum) {
            let (rhs, ty) = self.parse_input_rhs()?;
            if !assignable(var_type, ty) {
                return Err(ParseError::semantic(
                    format!("type mismatch: cannot initialize {} with {}", var_type, ty),
                    rhs.span(),
                ));
            }
            return Ok(VarInit::Shared(rhs));
        }

        let first = self.parse_or()?;

        if self.check(TokenKind::Comma) {
            let mut values = vec![first];
            while self.match_token(TokenKind::Comma) {
                values.push(self.parse_or()?);
            }
            if values.len() != names.len() {
                let span = values[0]
                    .expr
                    .span()
                    .to(values[values.len() - 1].expr.span());
                return Err(ParseError::semantic(
                    format!(
                        "{} name(s) declared but {} initializer(s) given",
                        names.len(),
                        values.len()
                    ),
                    span,
                ));
            }
            for (value, (name, _)) in values.iter().zip(names) {
                self.expect_single_value(value)?;
                self.check_initializer(var_type, value, name, immutable)?;
            }
            return Ok(VarInit::Each(values.into_iter().map(|t| t.expr).collect()));
        }

        if matches!(first.expr, Expr::Dead(_)) {
            if immutable {
                return Err(ParseError::semantic(
                    "an immutable declaration needs a live initializer",
                    first.expr.span(),
                ));
            }
            return Ok(VarInit::Dead);
        }

        match first.ty {
            StaticType::Multi(n) if names.len() > 1 => {
                if n != names.len() {
                    return Err(ParseError::semantic(
                        format!(
                            "function recalls {} values but {} names are declared",
                            n,
                            names.len()
                        ),
                        first.expr.span(),
                    ));
                }
            }
            _ => {
                self.expect_single_value(&first)?;
                self.check_initializer(var_type, &first, &names[0].0, immutable)?;
            }
        }

        Ok(VarInit::Shared(Rhs::Expr(first.expr)))
    }

    fn check_initializer(
        &self,
        var_type: ScalarType,
        value: &Typed,
        name: &str,
        immutable: bool,
    ) -> Result<(), ParseError> {
        if immutable && value.ty == StaticType::Dead {
            return Err(ParseError::semantic(
                format!("immutable '{}' needs a live initializer", name),
                value.expr.span(),
            ));
        }
        self.check_assignable(var_type, value, &format!("'{}'", name))
    }

    /// Type check for storing `value` into a slot of type `target`
    pub(crate) fn check_assignable(
        &self,
        target: ScalarType,
        value: &Typed,
        what: &str,
    ) -> Result<(), ParseError> {
        if assignable(target, value.ty) {
            Ok(())
        } else {
            Err(ParseError::semantic(
                format!(
                    "type mismatch: {} has type {} but the value is {}",
                    what, target, value.ty
                ),
                value.expr.span(),
            ))
        }
    }

    /// `load("prompt")` / `loadNum("prompt")` as a whole right-hand side
    pub(crate) fn parse_input_rhs(&mut self) -> Result<(Rhs, StaticType), ParseError> {
        let start = self.current_location();
        let token = self.advance();
        let kind = if token.kind == TokenKind::Load {
            InputKind::Load
        } else {
            InputKind::LoadNum
        };

        self.expect_token(
            TokenKind::LParen,
            &format!("Expected '(' after '{}'", kind.name()),
        )?;
        self.skip_newlines();
        let prompt = if self.check(TokenKind::RParen) {
            Expr::CommsLiteral(String::new(), token.span())
        } else {
            let prompt = self.parse_expression()?;
            if prompt.ty.is_known() && prompt.ty != StaticType::Comms {
                return Err(ParseError::semantic(
                    format!("the prompt of '{}' must be comms, found {}", kind.name(), prompt.ty),
                    prompt.expr.span(),
                ));
            }
            prompt.expr
        };
        self.skip_newlines();
        self.expect_token(
            TokenKind::RParen,
            &format!("Expected ')' after '{}' prompt", kind.name()),
        )?;

        let ty = match kind {
            InputKind::Load => StaticType::Comms,
            InputKind::LoadNum => StaticType::Numeric,
        };
        Ok((
            Rhs::Input {
                kind,
                prompt: Box::new(prompt),
                span: self.span_from(start),
            },
            ty,
        ))
    }

    fn parse_array_declaration(
        &mut self,
        start: SourceLocation,
        element_type: ScalarType,
        name: String,
        name_span: SourceSpan,
        immutable: bool,
    ) -> Result<Stmt, ParseError> {
        let mut dims = Vec::new();
        while self.match_token(TokenKind::LBracket) {
            let dim = match self.peek_kind() {
                TokenKind::RBracket => DimSize::Unsized,
                TokenKind::HpLiteral => {
                    let token = self.advance();
                    let size = token
                        .lexeme
                        .parse::<i64>()
                        .ok()
                        .and_then(|n| usize::try_from(n).ok())
                        .ok_or_else(|| {
                            ParseError::semantic(
                                format!("invalid array size '{}'", token.lexeme),
                                token.span(),
                            )
                        })?;
                    DimSize::Fixed(size)
                }
                TokenKind::Identifier(_) => {
                    let (size_name, size_span) = self.expect_identifier("")?;
                    let is_hp = matches!(
                        self.lookup(&size_name, size_span)?,
                        Binding::Variable(Variable {
                            ty: VarType::Scalar(ScalarType::Hp) | VarType::Untyped | VarType::Numeric,
                            ..
                        })
                    );
                    if !is_hp {
                        return Err(ParseError::semantic(
                            format!("array size '{}' must be an hp variable", size_name),
                            size_span,
                        ));
                    }
                    DimSize::Named(size_name, size_span)
                }
                _ => return Err(self.unexpected("Expected array size, size variable or ']'")),
            };
            self.expect_token(TokenKind::RBracket, "Expected ']' after array size")?;
            dims.push(dim);
        }

        if dims.len() > 2 {
            return Err(ParseError::semantic(
                format!("array '{}' has {} dimensions; at most 2 are allowed", name, dims.len()),
                self.span_from(start),
            ));
        }

        let init = if self.match_token(TokenKind::Colon) {
            self.parse_array_init(element_type, &name, &dims, immutable)?
        } else {
            if immutable {
                return Err(ParseError::semantic(
                    format!("immutable array '{}' needs an initializer", name),
                    self.span_from(start),
                ));
            }
            ArrayInit::Default
        };
        let span = self.span_from(start);

        let static_dims: Vec<Option<usize>> = dims
            .iter()
            .map(|dim| match dim {
                DimSize::Fixed(n) => Some(*n),
                _ => None,
            })
            .collect();
        let elements = match init {
            ArrayInit::Dead => None,
            _ => Some(ArrayElements::defaults(element_type, &static_dims)),
        };
        self.declare(
            &name,
            Binding::Array(ArrayBinding {
                element_type,
                dims: static_dims,
                elements,
                immutable,
            }),
            name_span,
        )?;

        Ok(Stmt::ArrayDecl {
            element_type,
            name,
            dims,
            init,
            immutable,
            span,
        })
    }

    fn parse_array_init(
        &mut self,
        element_type: ScalarType,
        name: &str,
        dims: &[DimSize],
        immutable: bool,
    ) -> Result<ArrayInit, ParseError> {
        match self.peek_kind() {
            TokenKind::Dead => {
                let token = self.advance();
                if immutable {
                    return Err(ParseError::semantic(
                        "an immutable declaration needs a live initializer",
                        token.span(),
                    ));
                }
                Ok(ArrayInit::Dead)
            }
            TokenKind::LBracket => Ok(ArrayInit::Literal(
                self.parse_array_literal(element_type, name, dims)?,
            )),
            TokenKind::Identifier(_) => {
                let (source, source_span) = self.expect_identifier("")?;
                if self.match_token(TokenKind::Dot) {
                    if !self.check(TokenKind::Drop) {
                        return Err(self.unexpected("Expected 'drop' after '.'"));
                    }
                    let taken = self.parse_drop(source, source_span, Vec::new())?;
                    return match taken {
                        Typed {
                            expr: Expr::Drop { array, index, .. },
                            ty: StaticType::Row(row_type),
                        } if row_type == element_type && dims.len() == 1 => {
                            Ok(ArrayInit::DropRow { array, index })
                        }
                        other => Err(ParseError::semantic(
                            format!(
                                "'{}' needs a 1-D {} row, but the initializer is {}",
                                name, element_type, other.ty
                            ),
                            other.expr.span(),
                        )),
                    };
                }

                let compatible = match self.lookup(&source, source_span)? {
                    Binding::Array(arr) => {
                        arr.element_type == element_type && arr.rank() == dims.len()
                    }
                    _ => false,
                };
                if !compatible {
                    return Err(ParseError::semantic(
                        format!(
                            "'{}' can only copy a {}-D {} array",
                            name,
                            dims.len(),
                            element_type
                        ),
                        source_span,
                    ));
                }
                Ok(ArrayInit::Copy(source))
            }
            _ => Err(self.unexpected("Expected array literal, 'dead' or an array name")),
        }
    }

    fn parse_array_literal(
        &mut self,
        element_type: ScalarType,
        name: &str,
        dims: &[DimSize],
    ) -> Result<ArrayLiteral, ParseError> {
        let start = self.current_location();

        if dims.len() == 1 {
            let items = self.parse_bracket_list()?;
            for item in &items {
                self.check_element(element_type, item, "array element")?;
            }
            if let DimSize::Fixed(size) = dims[0] {
                if items.len() != size {
                    return Err(ParseError::semantic(
                        format!(
                            "array '{}' is declared with size {} but initialized with {} element(s)",
                            name,
                            size,
                            items.len()
                        ),
                        self.span_from(start),
                    ));
                }
            }
            return Ok(ArrayLiteral::Flat(items.into_iter().map(|t| t.expr).collect()));
        }

        self.expect_token(TokenKind::LBracket, "Expected '['")?;
        self.skip_newlines();
        let mut rows = Vec::new();
        if !self.check(TokenKind::RBracket) {
            loop {
                if !self.check(TokenKind::LBracket) {
                    return Err(ParseError::semantic(
                        format!(
                            "array '{}' has 2 dimensions; every element of its initializer must be a row",
                            name
                        ),
                        self.peek().span(),
                    ));
                }
                let row_start = self.current_location();
                let row = self.parse_bracket_list()?;
                for item in &row {
                    self.check_element(element_type, item, "array element")?;
                }
                if let DimSize::Fixed(cols) = dims[1] {
                    if row.len() != cols {
                        return Err(ParseError::semantic(
                            format!(
                                "rows of '{}' are declared with {} column(s) but this row has {}",
                                name,
                                cols,
                                row.len()
                            ),
                            self.span_from(row_start),
                        ));
                    }
                }
                rows.push(row.into_iter().map(|t| t.expr).collect());
                self.skip_newlines();
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
        }
        self.skip_newlines();
        self.expect_token(TokenKind::RBracket, "Expected ']' to close the array literal")?;

        if let DimSize::Fixed(size) = dims[0] {
            if rows.len() != size {
                return Err(ParseError::semantic(
                    format!(
                        "array '{}' is declared with {} row(s) but initialized with {}",
                        name,
                        size,
                        rows.len()
                    ),
                    self.span_from(start),
                ));
            }
        }
        Ok(ArrayLiteral::Nested(rows))
    }

    /// `build Name { type field [: default], ... }`
    pub(crate) fn parse_struct_definition(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        self.advance(); // build
        let (name, name_span) = self.expect_identifier("after 'build'")?;
        self.expect_token(TokenKind::LBrace, "Expected '{' after struct name")?;
        self.skip_newlines();

        let mut fields: Vec<FieldDecl> = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let field_start = self.current_location();
            let Some(field_type) = scalar_type_of(self.peek_kind()) else {
                return Err(self.unexpected("Expected field type"));
            };
            self.advance();
            let (field_name, field_span) = self.expect_identifier("as field name")?;
            if fields.iter().any(|f| f.name == field_name) {
                return Err(ParseError::semantic(
                    format!("field '{}' is declared twice in '{}'", field_name, name),
                    field_span,
                ));
            }

            let default = if self.match_token(TokenKind::Colon) {
                let value = self.parse_expression()?;
                self.check_element(field_type, &value, &format!("field '{}'", field_name))?;
                Some(value.expr)
            } else {
                None
            };

            fields.push(FieldDecl {
                name: field_name,
                field_type,
                default,
                span: self.span_from(field_start),
            });

            self.skip_newlines();
            if !self.match_token(TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.skip_newlines();
        self.expect_token(TokenKind::RBrace, "Expected '}' after struct fields")?;

        if fields.is_empty() {
            return Err(ParseError::semantic(
                format!("struct '{}' has no fields", name),
                name_span,
            ));
        }

        let def = StructDef {
            fields: fields
                .iter()
                .map(|f| FieldDef {
                    name: f.name.clone(),
                    ty: f.field_type,
                    default: Value::default_for(f.field_type),
                })
                .collect(),
        };
        self.declare(&name, Binding::StructDef(def), name_span)?;

        Ok(Stmt::StructDef {
            name,
            fields,
            span: self.span_from(start),
        })
    }

    /// `[immo] access Name instance [: values]`
    fn parse_struct_instance(
        &mut self,
        start: SourceLocation,
        immutable: bool,
    ) -> Result<Stmt, ParseError> {
        self.advance(); // access
        let (struct_name, struct_span) = self.expect_identifier("after 'access'")?;
        let (name, name_span) = self.expect_identifier("for the struct instance")?;

        let fields: Vec<(String, ScalarType)> = match self.lookup(&struct_name, struct_span)? {
            Binding::StructDef(def) => def.fields.iter().map(|f| (f.name.clone(), f.ty)).collect(),
            other => {
                return Err(ParseError::semantic(
                    format!("'{}' is a {}, not a struct type", struct_name, other.kind_name()),
                    struct_span,
                ))
            }
        };

        let mut args = Vec::new();
        if self.match_token(TokenKind::Colon) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        let span = self.span_from(start);

        if args.len() > fields.len() {
            return Err(ParseError::semantic(
                format!(
                    "struct '{}' has {} field(s) but {} initializer(s) were given",
                    struct_name,
                    fields.len(),
                    args.len()
                ),
                span,
            ));
        }
        for (arg, (field, ty)) in args.iter().zip(&fields) {
            self.check_element(*ty, arg, &format!("field '{}'", field))?;
        }

        let instance = StructInstance {
            parent: struct_name.clone(),
            fields: fields
                .iter()
                .map(|(field, ty)| (field.clone(), Value::default_for(*ty)))
                .collect(),
            immutable,
        };
        self.declare(&name, Binding::StructInstance(instance), name_span)?;

        Ok(Stmt::StructInstance {
            struct_name,
            name,
            args: args.into_iter().map(|t| t.expr).collect(),
            immutable,
            span,
        })
    }

    /// `name(params) { body }` at global scope
    pub(crate) fn parse_function_definition(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        let (name, name_span) = self.expect_identifier("as function name")?;
        self.expect_token(TokenKind::LParen, "Expected '(' after function name")?;
        self.skip_newlines();

        let mut params: Vec<Param> = Vec::new();
        let mut param_spans = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let (param, param_span) = self.expect_identifier("as parameter name")?;
                if params.iter().any(|p| p.name == param) {
                    return Err(ParseError::semantic(
                        format!("parameter '{}' is declared twice", param),
                        param_span,
                    ));
                }

                let default = if self.match_token(TokenKind::Colon) {
                    let value = self.parse_expression()?;
                    if value.ty == StaticType::Dead {
                        return Err(ParseError::semantic(
                            "a parameter default cannot be dead",
                            value.expr.span(),
                        ));
                    }
                    Some(value.expr)
                } else {
                    if params.iter().any(|p| p.default.is_some()) {
                        return Err(ParseError::semantic(
                            format!(
                                "parameter '{}' without a default follows one with a default",
                                param
                            ),
                            param_span,
                        ));
                    }
                    None
                };

                params.push(Param {
                    name: param,
                    default,
                });
                param_spans.push(param_span);

                self.skip_newlines();
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
        }
        self.expect_token(TokenKind::RParen, "Expected ')' after parameters")?;

        // registered before the body so the body can recurse
        self.declare(
            &name,
            Binding::Function(Function {
                params: params.clone(),
                body: Rc::new(Vec::new()),
                arity: None,
            }),
            name_span,
        )?;

        let saved = self.env.enter_function(&name);
        for (param, span) in params.iter().zip(&param_spans) {
            self.declare(
                &param.name,
                Binding::Variable(Variable::new(
                    VarType::Untyped,
                    Value::Pending(NumericHint::Any),
                    false,
                )),
                *span,
            )?;
        }
        let outer_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.function = Some(FunctionContext {
            name: name.clone(),
            arity: None,
        });

        let body = self.parse_block_body("function body");

        let context = self.function.take();
        self.loop_depth = outer_loops;
        self.env.exit_function(saved);
        let body = Rc::new(body?);

        let arity = context.and_then(|ctx| ctx.arity).unwrap_or(0);
        self.env
            .replace(
                &name,
                Binding::Function(Function {
                    params: params.clone(),
                    body: Rc::clone(&body),
                    arity: Some(arity),
                }),
            )
            .map_err(|err| ParseError::from_env(err, name_span))?;
        tracing::trace!(function = %name, arity, "registered function");

        Ok(Stmt::FunctionDef {
            name,
            params,
            body,
            span: self.span_from(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::lexer::tokenize;
    use crate::parser::parse::{ParseError, Parser};

    fn parse(source: &str) -> Result<Program, ParseError> {
        let out = tokenize(source);
        assert!(out.is_clean(), "lexer diagnostics: {:?}", out.diagnostics);
        Parser::new(out.tokens).parse_program()
    }

    #[test]
    fn test_batch_declarations() {
        let program = parse("hp a, b, c: 0\nhp d, e: 1, 2\nplay() {\n}").unwrap();
        assert!(matches!(
            &program.items[0],
            Stmt::VarDecl { names, init: VarInit::Shared(_), .. } if names.len() == 3
        ));
        assert!(matches!(
            &program.items[1],
            Stmt::VarDecl { init: VarInit::Each(values), .. } if values.len() == 2
        ));
        assert!(parse("hp d, e: 1, 2, 3\nplay() {\n}").is_err());
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let err = parse("hp x: 1\nhp x: 2\nplay() {\n}").unwrap_err();
        assert!(err.message.contains("already declared"), "{}", err.message);
        // shadowing in an inner frame is fine
        assert!(parse("hp x: 1\nplay() {\n\thp x: 2\n}").is_ok());
    }

    #[test]
    fn test_dead_redeclaration() {
        assert!(parse("play() {\n\thp x: dead\n\thp x: 4\n}").is_ok());
        assert!(parse("play() {\n\thp x: dead\n\txp x: 4.0\n}").is_err());
    }

    #[test]
    fn test_array_size_must_match_literal() {
        assert!(parse("hp a[3]: [1, 2, 3]\nplay() {\n}").is_ok());
        let err = parse("hp a[2]: [1, 2, 3]\nplay() {\n}").unwrap_err();
        assert!(err.message.contains("size 2"), "{}", err.message);
        assert!(parse("hp m[2][2]: [[1, 2], [3]]\nplay() {\n}").is_err());
    }

    #[test]
    fn test_array_copy_and_row_initializers() {
        let source = "hp m[][]: [[1, 2], [3, 4]]\nplay() {\n\thp r[]: m.drop()\n\thp c[]: r\n}";
        let program = parse(source).unwrap();
        match &program.items[1] {
            Stmt::Play { body, .. } => {
                assert!(matches!(
                    &body[0],
                    Stmt::ArrayDecl { init: ArrayInit::DropRow { .. }, .. }
                ));
                assert!(matches!(
                    &body[1],
                    Stmt::ArrayDecl { init: ArrayInit::Copy(name), .. } if name == "r"
                ));
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_struct_arity() {
        assert!(parse("build P { hp x: 0, hp y }\naccess P p: 1\nplay() {\n}").is_ok());
        let err = parse("build P { hp x, hp y }\naccess P p: 1, 2, 3\nplay() {\n}").unwrap_err();
        assert!(err.message.contains("2 field(s)"), "{}", err.message);
    }

    #[test]
    fn test_parameter_defaults_must_trail() {
        assert!(parse("f(a, b: 1) {\n\trecall a + b\n}\nplay() {\n}").is_ok());
        assert!(parse("f(a: 1, b) {\n\trecall a\n}\nplay() {\n}").is_err());
    }

    #[test]
    fn test_multi_value_initializer() {
        let source = "pair() {\n\trecall 1, 2\n}\nplay() {\n\thp q, r: pair()\n}";
        assert!(parse(source).is_ok());

        let single = "pair() {\n\trecall 1, 2\n}\nplay() {\n\thp q: pair()\n}";
        let err = parse(single).unwrap_err();
        assert!(err.message.contains("recalls 2 values"), "{}", err.message);
    }

    #[test]
    fn test_calling_a_later_function_is_use_before_declare() {
        let source = "f() {\n\trecall g()\n}\ng() {\n\trecall 1\n}\nplay() {\n}";
        let err = parse(source).unwrap_err();
        assert!(err.message.contains("not declared"), "{}", err.message);
    }

    #[test]
    fn test_immutable_needs_live_initializer() {
        assert!(parse("immo hp k: 10\nplay() {\n}").is_ok());
        assert!(parse("immo hp k: dead\nplay() {\n}").is_err());
        assert!(parse("immo hp k\nplay() {\n}").is_err());
    }
}
