//! Lowering of a semantically validated AST into a textual LLVM IR module.
//!
//! The generator trusts well-typedness and only reconciles numeric widths.
//! Identifiers resolve to stack-slot pointers (locals, parameters) or global
//! pointers through a per-function symbol stack whose bottom holds the module
//! globals. String and format-string constants are interned module-wide,
//! keyed by a stable hash of their bytes. Any invariant violation (undefined
//! name, unsupported cast, non-constant global initializer) aborts lowering:
//! the semantic pass should have prevented it.

use std::hash::Hasher;

use anyhow::{Result, bail};
use rustc_hash::{FxHashMap, FxHasher};

use tiza_ast::nodes::{
    Assignment, BinaryExpression, BinaryOperator, Block, CallExpression, Declaration, Expression,
    ForInit, ForStatement, Function, IfStatement, NumberValue, PrintStatement, Program, Statement,
    Ty, UnaryExpression, UnaryOperator,
};

use crate::ir::{IrFunction, IrGlobal, IrModule, IrType, IrValue, escape_bytes, format_double};

const TARGET_TRIPLE: &str = "x86_64-pc-linux-gnu";

/// Build flags; `windows_exe` only affects the epilogue of `main`, which
/// then calls `getchar` before returning 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodegenOptions {
    pub windows_exe: bool,
}

/// Lowers a validated program and returns the textual module.
///
/// # Errors
///
/// Fails on generator invariant violations; see the module docs.
pub fn codegen(program: &Program, options: &CodegenOptions) -> Result<String> {
    LlvmGenerator::new(*options).generate(program)
}

#[derive(Clone)]
struct Slot {
    /// `%local` or `@global` pointer the identifier resolves to.
    ptr: String,
    /// Pointee type of the slot.
    ty: IrType,
}

#[derive(Clone)]
struct FuncSig {
    return_type: IrType,
}

/// Insertion cursor: the function under construction and the current block.
struct FnCtx {
    func: IrFunction,
    block: usize,
}

impl FnCtx {
    fn emit(&mut self, instruction: impl Into<String>) {
        self.func.push(self.block, instruction);
    }

    fn label(&self, block: usize) -> String {
        format!("%{}", self.func.block_label(block))
    }
}

pub struct LlvmGenerator {
    module: IrModule,
    options: CodegenOptions,
    slots: Vec<FxHashMap<String, Slot>>,
    functions: FxHashMap<String, FuncSig>,
}

impl LlvmGenerator {
    #[must_use]
    pub fn new(options: CodegenOptions) -> Self {
        let mut generator = Self {
            module: IrModule::new("tiza_programa", TARGET_TRIPLE),
            options,
            slots: vec![FxHashMap::default()],
            functions: FxHashMap::default(),
        };
        generator.setup_builtins();
        generator
    }

    /// Lowers the whole program: globals, user functions, then `main`.
    ///
    /// # Errors
    ///
    /// Fails on generator invariant violations.
    pub fn generate(mut self, program: &Program) -> Result<String> {
        self.module.name = program.name.clone();
        for global in &program.globals {
            self.generate_global(global)?;
        }
        for function in &program.functions {
            self.generate_function(function)?;
        }
        self.generate_main(&program.block)?;
        Ok(self.module.to_string())
    }

    fn setup_builtins(&mut self) {
        self.module.declare("declare i32 @printf(i8*, ...)");
        self.module.declare("declare i32 @getchar()");
        self.module.declare("declare i8* @malloc(i64)");
        self.module.declare("declare i64 @strlen(i8*)");
        self.module
            .declare("declare void @llvm.memcpy.p0i8.p0i8.i64(i8*, i8*, i64, i1)");
        self.module.declare("declare double @pow(double, double)");
        self.module.declare("declare double @fmod(double, double)");
        self.define_concat();
    }

    /// `i8* concat(i8* a, i8* b)`: allocates `len(a)+len(b)+1`, copies both
    /// operands, writes the terminating NUL and returns the buffer.
    fn define_concat(&mut self) {
        let i8p = IrType::i8_ptr();
        let mut func = IrFunction::new(
            "concat",
            i8p.clone(),
            vec![("a".to_string(), i8p.clone()), ("b".to_string(), i8p)],
        );
        let entry = func.append_block("entry");
        func.push(entry, "%len.a = call i64 @strlen(i8* %a)");
        func.push(entry, "%len.b = call i64 @strlen(i8* %b)");
        func.push(entry, "%len.sum = add i64 %len.a, %len.b");
        func.push(entry, "%len.total = add i64 %len.sum, 1");
        func.push(entry, "%buf = call i8* @malloc(i64 %len.total)");
        func.push(
            entry,
            "call void @llvm.memcpy.p0i8.p0i8.i64(i8* %buf, i8* %a, i64 %len.a, i1 false)",
        );
        func.push(entry, "%dst = getelementptr i8, i8* %buf, i64 %len.a");
        func.push(
            entry,
            "call void @llvm.memcpy.p0i8.p0i8.i64(i8* %dst, i8* %b, i64 %len.b, i1 false)",
        );
        func.push(entry, "%end = getelementptr i8, i8* %buf, i64 %len.sum");
        func.push(entry, "store i8 0, i8* %end");
        func.push(entry, "ret i8* %buf");
        self.module.add_function(func);
    }

    fn lower(ty: Ty) -> IrType {
        match ty {
            Ty::Int32 | Ty::Inferred => IrType::I32,
            Ty::Float64 => IrType::Double,
            Ty::Bool => IrType::I1,
            Ty::String => IrType::i8_ptr(),
            Ty::Void => IrType::Void,
        }
    }

    fn stable_hash(bytes: &[u8]) -> u64 {
        let mut hasher = FxHasher::default();
        hasher.write(bytes);
        hasher.finish()
    }

    /// Interns a byte constant as an internal global, one per distinct
    /// content; returns the global name and the array length.
    fn intern_bytes(&mut self, prefix: &str, bytes: &[u8]) -> (String, usize) {
        let name = format!("{prefix}{}", Self::stable_hash(bytes));
        if !self.module.has_global(&name) {
            self.module.add_global(IrGlobal {
                name: name.clone(),
                ty: IrType::byte_array(bytes.len()),
                initializer: format!("c\"{}\"", escape_bytes(bytes)),
                internal: true,
                constant: true,
            });
        }
        (name, bytes.len())
    }

    /// Emits the NUL-terminated string constant and a `bitcast` to `i8*`.
    fn string_constant(&mut self, ctx: &mut FnCtx, text: &str) -> IrValue {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        let (name, len) = self.intern_bytes(".str.", &bytes);
        let tmp = ctx.func.fresh_tmp();
        ctx.emit(format!("{tmp} = bitcast [{len} x i8]* @{name} to i8*"));
        IrValue::new(IrType::i8_ptr(), tmp)
    }

    // ---- globals ----------------------------------------------------------

    fn generate_global(&mut self, declaration: &Declaration) -> Result<()> {
        let value = match &declaration.init {
            Some(init) => self.const_initializer(&declaration.name, init)?,
            None => Self::zero_value(&Self::lower(declaration.ty)),
        };
        let (ty, initializer) = if declaration.ty == Ty::Inferred {
            (value.ty, value.repr)
        } else {
            let target = Self::lower(declaration.ty);
            let folded = Self::fold_cast(value, &target)?;
            (target, folded.repr)
        };
        self.module.add_global(IrGlobal {
            name: declaration.name.clone(),
            ty: ty.clone(),
            initializer,
            internal: false,
            constant: false,
        });
        self.slots[0].insert(
            declaration.name.clone(),
            Slot {
                ptr: format!("@{}", declaration.name),
                ty,
            },
        );
        Ok(())
    }

    /// Constant-folds a global initializer. Numbers, booleans, signs on
    /// numbers and string literals are supported; anything else is a bug the
    /// semantic pass let through.
    fn const_initializer(&mut self, name: &str, expression: &Expression) -> Result<IrValue> {
        match expression {
            Expression::Number(number) => Ok(Self::number_value(number.value)),
            Expression::Bool(boolean) => Ok(IrValue::new(
                IrType::I1,
                if boolean.value { "true" } else { "false" },
            )),
            Expression::Str(string) => {
                let mut bytes = string.value.as_bytes().to_vec();
                bytes.push(0);
                let (global, len) = self.intern_bytes(".str.", &bytes);
                Ok(IrValue::new(
                    IrType::i8_ptr(),
                    format!("bitcast ([{len} x i8]* @{global} to i8*)"),
                ))
            }
            Expression::Unary(unary) => match (unary.op, &unary.operand) {
                (UnaryOperator::Pos, operand) => self.const_initializer(name, operand),
                (UnaryOperator::Neg, Expression::Number(number)) => {
                    Ok(Self::number_value(match number.value {
                        NumberValue::Int(v) => NumberValue::Int(-v),
                        NumberValue::Float(v) => NumberValue::Float(-v),
                    }))
                }
                _ => bail!("El inicializador global de '{name}' no es constante"),
            },
            _ => bail!("El inicializador global de '{name}' no es constante"),
        }
    }

    fn number_value(value: NumberValue) -> IrValue {
        match value {
            NumberValue::Int(v) => IrValue::new(IrType::I32, v.to_string()),
            NumberValue::Float(v) => IrValue::new(IrType::Double, format_double(v)),
        }
    }

    fn zero_value(ty: &IrType) -> IrValue {
        let repr = match ty {
            IrType::Double => format_double(0.0),
            IrType::I1 => "false".to_string(),
            IrType::Ptr(_) => "null".to_string(),
            _ => "0".to_string(),
        };
        IrValue::new(ty.clone(), repr)
    }

    /// Constant-level coercion for global initializers.
    #[allow(clippy::cast_precision_loss)]
    fn fold_cast(value: IrValue, target: &IrType) -> Result<IrValue> {
        if value.ty == *target {
            return Ok(value);
        }
        if value.ty.is_int() && target.is_double() {
            let folded = value
                .repr
                .parse::<i64>()
                .map_err(|_| anyhow::anyhow!("No suitable cast from {} to {target}", value.ty))?;
            return Ok(IrValue::new(IrType::Double, format_double(folded as f64)));
        }
        bail!("No suitable cast from {} to {target}", value.ty)
    }

    // ---- functions --------------------------------------------------------

    fn generate_function(&mut self, function: &Function) -> Result<()> {
        let return_type = Self::lower(function.return_type);
        let params: Vec<(String, IrType)> = function
            .parameters
            .iter()
            .map(|p| (p.name.clone(), Self::lower(p.ty)))
            .collect();
        // Registered before the body so recursive calls resolve.
        self.functions.insert(
            function.name.clone(),
            FuncSig {
                return_type: return_type.clone(),
            },
        );

        let mut func = IrFunction::new(&function.name, return_type.clone(), params.clone());
        let entry = func.append_block("entry");
        let mut ctx = FnCtx { func, block: entry };

        self.slots.push(FxHashMap::default());
        for (name, ty) in &params {
            let ptr = ctx.func.fresh_local(&format!("{name}.addr"));
            ctx.emit(format!("{ptr} = alloca {ty}"));
            ctx.emit(format!("store {ty} %{name}, {ty}* {ptr}"));
            self.slots.last_mut().unwrap().insert(
                name.clone(),
                Slot {
                    ptr,
                    ty: ty.clone(),
                },
            );
        }

        self.generate_block(&mut ctx, &function.body)?;

        if !ctx.func.has_terminator(ctx.block) {
            if return_type == IrType::Void {
                ctx.emit("ret void");
            } else {
                ctx.emit("unreachable");
            }
        }

        self.slots.pop();
        self.module.add_function(ctx.func);
        Ok(())
    }

    /// Synthesizes `i32 @main` around the program's main block. Without a
    /// terminator of its own, the epilogue optionally pauses on `getchar`
    /// (windows-exe builds only) and returns 0.
    fn generate_main(&mut self, block: &Block) -> Result<()> {
        let mut func = IrFunction::new("main", IrType::I32, vec![]);
        let entry = func.append_block("entry");
        let mut ctx = FnCtx { func, block: entry };

        self.slots.push(FxHashMap::default());
        self.generate_block(&mut ctx, block)?;
        self.slots.pop();

        if !ctx.func.has_terminator(ctx.block) {
            if self.options.windows_exe {
                let tmp = ctx.func.fresh_tmp();
                ctx.emit(format!("{tmp} = call i32 @getchar()"));
            }
            ctx.emit("ret i32 0");
        }
        self.module.add_function(ctx.func);
        Ok(())
    }

    // ---- statements -------------------------------------------------------

    fn generate_block(&mut self, ctx: &mut FnCtx, block: &Block) -> Result<()> {
        for statement in &block.statements {
            self.generate_statement(ctx, statement)?;
        }
        Ok(())
    }

    fn generate_statement(&mut self, ctx: &mut FnCtx, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Declaration(declaration) => self.generate_declaration(ctx, declaration),
            Statement::Assignment(assignment) => {
                self.generate_assignment(ctx, assignment)?;
                Ok(())
            }
            Statement::Print(print) => self.generate_print(ctx, print),
            Statement::If(if_stmt) => self.generate_if(ctx, if_stmt),
            Statement::While(while_stmt) => self.generate_while(ctx, while_stmt),
            Statement::DoWhile(do_while) => self.generate_do_while(ctx, do_while),
            Statement::For(for_stmt) => self.generate_for(ctx, for_stmt),
            Statement::Return(ret) => self.generate_return(ctx, ret),
            Statement::Call(call) => {
                self.generate_call(ctx, call)?;
                Ok(())
            }
            Statement::Block(block) => self.generate_block(ctx, block),
        }
    }

    fn generate_declaration(&mut self, ctx: &mut FnCtx, declaration: &Declaration) -> Result<()> {
        let (ty, value) = match &declaration.init {
            Some(init) => {
                let value = self.generate_expression(ctx, init)?;
                if declaration.ty == Ty::Inferred {
                    (value.ty.clone(), Some(value))
                } else {
                    let target = Self::lower(declaration.ty);
                    let value = Self::cast_value(ctx, value, &target)?;
                    (target, Some(value))
                }
            }
            None => (Self::lower(declaration.ty), None),
        };
        let ptr = ctx.func.fresh_local(&declaration.name);
        ctx.emit(format!("{ptr} = alloca {ty}"));
        if let Some(value) = value {
            ctx.emit(format!("store {}, {ty}* {ptr}", value.typed()));
        }
        self.slots
            .last_mut()
            .unwrap()
            .insert(declaration.name.clone(), Slot { ptr, ty });
        Ok(())
    }

    fn generate_assignment(&mut self, ctx: &mut FnCtx, assignment: &Assignment) -> Result<IrValue> {
        let value = self.generate_expression(ctx, &assignment.value)?;
        let slot = self.lookup_slot(&assignment.name)?;
        ctx.emit(format!("store {}, {}* {}", value.typed(), slot.ty, slot.ptr));
        Ok(value)
    }

    /// Builds the `%s %f %d` format string, interns it, and calls `printf`.
    /// `i1` values widen to `i32` before the vararg call.
    fn generate_print(&mut self, ctx: &mut FnCtx, print: &PrintStatement) -> Result<()> {
        let mut parts = Vec::new();
        let mut values = Vec::new();
        for argument in &print.arguments {
            let mut value = self.generate_expression(ctx, argument)?;
            if value.ty == IrType::i8_ptr() {
                parts.push("%s");
            } else if value.ty.is_double() {
                parts.push("%f");
            } else if let Some(width) = value.ty.int_width() {
                parts.push("%d");
                if width == 1 {
                    let tmp = ctx.func.fresh_tmp();
                    ctx.emit(format!("{tmp} = zext i1 {} to i32", value.repr));
                    value = IrValue::new(IrType::I32, tmp);
                } else if width != 32 {
                    let tmp = ctx.func.fresh_tmp();
                    ctx.emit(format!("{tmp} = sext {} {} to i32", value.ty, value.repr));
                    value = IrValue::new(IrType::I32, tmp);
                }
            } else {
                bail!("Tipo no soportado para imprimir: {}", value.ty);
            }
            values.push(value);
        }

        let format = format!("{}\n\0", parts.join(" "));
        let (name, len) = self.intern_bytes(".fmt.", format.as_bytes());
        let fmt_ptr = ctx.func.fresh_tmp();
        ctx.emit(format!("{fmt_ptr} = bitcast [{len} x i8]* @{name} to i8*"));

        let mut call_args = vec![format!("i8* {fmt_ptr}")];
        call_args.extend(values.iter().map(IrValue::typed));
        let tmp = ctx.func.fresh_tmp();
        ctx.emit(format!(
            "{tmp} = call i32 (i8*, ...) @printf({})",
            call_args.join(", ")
        ));
        Ok(())
    }

    fn generate_if(&mut self, ctx: &mut FnCtx, if_stmt: &IfStatement) -> Result<()> {
        let cond = self.generate_expression(ctx, &if_stmt.condition)?;
        let then_block = ctx.func.append_block("if.then");
        let else_block = if_stmt
            .else_branch
            .as_ref()
            .map(|_| ctx.func.append_block("if.else"));
        let merge_block = ctx.func.append_block("if.merge");

        let bool_cond = Self::to_bool(ctx, cond)?;
        let false_target = else_block.unwrap_or(merge_block);
        ctx.emit(format!(
            "br i1 {}, label {}, label {}",
            bool_cond.repr,
            ctx.label(then_block),
            ctx.label(false_target)
        ));

        ctx.block = then_block;
        self.generate_statement(ctx, &if_stmt.then_branch)?;
        let then_terminated = ctx.func.has_terminator(ctx.block);
        if !then_terminated {
            let merge = ctx.label(merge_block);
            ctx.emit(format!("br label {merge}"));
        }

        let else_terminated = if let (Some(else_branch), Some(else_block)) =
            (&if_stmt.else_branch, else_block)
        {
            ctx.block = else_block;
            self.generate_statement(ctx, else_branch)?;
            let terminated = ctx.func.has_terminator(ctx.block);
            if !terminated {
                let merge = ctx.label(merge_block);
                ctx.emit(format!("br label {merge}"));
            }
            terminated
        } else {
            false
        };

        if then_terminated && else_terminated {
            // Nothing reaches the merge block; drop it from the output.
            ctx.func.remove_block(merge_block);
        } else {
            ctx.block = merge_block;
        }
        Ok(())
    }

    fn generate_while(
        &mut self,
        ctx: &mut FnCtx,
        while_stmt: &tiza_ast::nodes::WhileStatement,
    ) -> Result<()> {
        let test_block = ctx.func.append_block("while.test");
        let body_block = ctx.func.append_block("while.body");
        let end_block = ctx.func.append_block("while.end");

        ctx.emit(format!("br label {}", ctx.label(test_block)));

        ctx.block = test_block;
        let cond = self.generate_expression(ctx, &while_stmt.condition)?;
        let bool_cond = Self::to_bool(ctx, cond)?;
        ctx.emit(format!(
            "br i1 {}, label {}, label {}",
            bool_cond.repr,
            ctx.label(body_block),
            ctx.label(end_block)
        ));

        ctx.block = body_block;
        self.generate_statement(ctx, &while_stmt.body)?;
        if !ctx.func.has_terminator(ctx.block) {
            ctx.emit(format!("br label {}", ctx.label(test_block)));
        }

        ctx.block = end_block;
        Ok(())
    }

    fn generate_do_while(
        &mut self,
        ctx: &mut FnCtx,
        do_while: &tiza_ast::nodes::DoWhileStatement,
    ) -> Result<()> {
        let body_block = ctx.func.append_block("do.body");
        let test_block = ctx.func.append_block("do.test");
        let end_block = ctx.func.append_block("do.end");

        ctx.emit(format!("br label {}", ctx.label(body_block)));

        ctx.block = body_block;
        self.generate_statement(ctx, &do_while.body)?;
        if !ctx.func.has_terminator(ctx.block) {
            ctx.emit(format!("br label {}", ctx.label(test_block)));
        }

        ctx.block = test_block;
        let cond = self.generate_expression(ctx, &do_while.condition)?;
        let bool_cond = Self::to_bool(ctx, cond)?;
        ctx.emit(format!(
            "br i1 {}, label {}, label {}",
            bool_cond.repr,
            ctx.label(body_block),
            ctx.label(end_block)
        ));

        ctx.block = end_block;
        Ok(())
    }

    fn generate_for(&mut self, ctx: &mut FnCtx, for_stmt: &ForStatement) -> Result<()> {
        let init_block = ctx.func.append_block("for.init");
        let test_block = ctx.func.append_block("for.test");
        let body_block = ctx.func.append_block("for.body");
        let update_block = ctx.func.append_block("for.update");
        let end_block = ctx.func.append_block("for.end");

        ctx.emit(format!("br label {}", ctx.label(init_block)));

        ctx.block = init_block;
        match &for_stmt.init {
            Some(ForInit::Declaration(declaration)) => {
                self.generate_declaration(ctx, declaration)?;
            }
            Some(ForInit::Expression(expression)) => {
                self.generate_expression(ctx, expression)?;
            }
            None => {}
        }
        ctx.emit(format!("br label {}", ctx.label(test_block)));

        ctx.block = test_block;
        if let Some(condition) = &for_stmt.condition {
            let cond = self.generate_expression(ctx, condition)?;
            let bool_cond = Self::to_bool(ctx, cond)?;
            ctx.emit(format!(
                "br i1 {}, label {}, label {}",
                bool_cond.repr,
                ctx.label(body_block),
                ctx.label(end_block)
            ));
        } else {
            // A missing condition is always true.
            ctx.emit(format!("br label {}", ctx.label(body_block)));
        }

        ctx.block = body_block;
        self.generate_statement(ctx, &for_stmt.body)?;
        if !ctx.func.has_terminator(ctx.block) {
            ctx.emit(format!("br label {}", ctx.label(update_block)));
        }

        ctx.block = update_block;
        if let Some(update) = &for_stmt.update {
            self.generate_expression(ctx, update)?;
        }
        ctx.emit(format!("br label {}", ctx.label(test_block)));

        ctx.block = end_block;
        Ok(())
    }

    fn generate_return(
        &mut self,
        ctx: &mut FnCtx,
        ret: &tiza_ast::nodes::ReturnStatement,
    ) -> Result<()> {
        match &ret.value {
            Some(value) => {
                let value = self.generate_expression(ctx, value)?;
                ctx.emit(format!("ret {}", value.typed()));
            }
            None => ctx.emit("ret void"),
        }
        Ok(())
    }

    fn generate_call(&mut self, ctx: &mut FnCtx, call: &CallExpression) -> Result<IrValue> {
        let Some(sig) = self.functions.get(&call.name).cloned() else {
            bail!("Función '{}' no definida", call.name);
        };
        let mut args = Vec::new();
        for argument in &call.arguments {
            let value = self.generate_expression(ctx, argument)?;
            args.push(value.typed());
        }
        let args = args.join(", ");
        if sig.return_type == IrType::Void {
            ctx.emit(format!("call void @{}({args})", call.name));
            return Ok(IrValue::new(IrType::Void, String::new()));
        }
        let tmp = ctx.func.fresh_tmp();
        ctx.emit(format!(
            "{tmp} = call {} @{}({args})",
            sig.return_type, call.name
        ));
        Ok(IrValue::new(sig.return_type, tmp))
    }

    // ---- expressions ------------------------------------------------------

    fn generate_expression(&mut self, ctx: &mut FnCtx, expression: &Expression) -> Result<IrValue> {
        match expression {
            Expression::Number(number) => Ok(Self::number_value(number.value)),
            Expression::Bool(boolean) => Ok(IrValue::new(
                IrType::I1,
                if boolean.value { "true" } else { "false" },
            )),
            Expression::Str(string) => Ok(self.string_constant(ctx, &string.value)),
            Expression::Variable(identifier) => {
                let slot = self.lookup_slot(&identifier.name)?;
                let tmp = ctx.func.fresh_tmp();
                ctx.emit(format!(
                    "{tmp} = load {}, {}* {}",
                    slot.ty, slot.ty, slot.ptr
                ));
                Ok(IrValue::new(slot.ty, tmp))
            }
            Expression::Binary(binary) => self.generate_binary(ctx, binary),
            Expression::Unary(unary) => self.generate_unary(ctx, unary),
            Expression::Call(call) => self.generate_call(ctx, call),
            Expression::Assign(assignment) => self.generate_assignment(ctx, assignment),
        }
    }

    fn generate_binary(&mut self, ctx: &mut FnCtx, binary: &BinaryExpression) -> Result<IrValue> {
        let left = self.generate_expression(ctx, &binary.left)?;
        let right = self.generate_expression(ctx, &binary.right)?;
        let (left, right) = Self::match_types(ctx, left, right);

        let op = binary.op;
        if op == BinaryOperator::Add && left.ty == IrType::i8_ptr() && right.ty == IrType::i8_ptr()
        {
            let tmp = ctx.func.fresh_tmp();
            ctx.emit(format!(
                "{tmp} = call i8* @concat(i8* {}, i8* {})",
                left.repr, right.repr
            ));
            return Ok(IrValue::new(IrType::i8_ptr(), tmp));
        }

        match op {
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::Mod => self.generate_arithmetic(ctx, op, &left, &right),
            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => Ok(Self::generate_comparison(ctx, op, &left, &right)),
            BinaryOperator::And | BinaryOperator::Or => {
                let left = Self::to_bool(ctx, left)?;
                let right = Self::to_bool(ctx, right)?;
                let opcode = if op == BinaryOperator::And { "and" } else { "or" };
                let tmp = ctx.func.fresh_tmp();
                ctx.emit(format!("{tmp} = {opcode} i1 {}, {}", left.repr, right.repr));
                Ok(IrValue::new(IrType::I1, tmp))
            }
            BinaryOperator::Pow => self.generate_power(ctx, left, right),
        }
    }

    fn generate_arithmetic(
        &mut self,
        ctx: &mut FnCtx,
        op: BinaryOperator,
        left: &IrValue,
        right: &IrValue,
    ) -> Result<IrValue> {
        if left.ty.is_int() && right.ty.is_int() {
            let opcode = match op {
                BinaryOperator::Add => "add",
                BinaryOperator::Sub => "sub",
                BinaryOperator::Mul => "mul",
                BinaryOperator::Div => "sdiv",
                BinaryOperator::Mod => "srem",
                _ => unreachable!("arithmetic operator"),
            };
            let tmp = ctx.func.fresh_tmp();
            ctx.emit(format!(
                "{tmp} = {opcode} {} {}, {}",
                left.ty, left.repr, right.repr
            ));
            return Ok(IrValue::new(left.ty.clone(), tmp));
        }
        if left.ty.is_double() && right.ty.is_double() {
            if op == BinaryOperator::Mod {
                let tmp = ctx.func.fresh_tmp();
                ctx.emit(format!(
                    "{tmp} = call double @fmod(double {}, double {})",
                    left.repr, right.repr
                ));
                return Ok(IrValue::new(IrType::Double, tmp));
            }
            let opcode = match op {
                BinaryOperator::Add => "fadd",
                BinaryOperator::Sub => "fsub",
                BinaryOperator::Mul => "fmul",
                BinaryOperator::Div => "fdiv",
                _ => unreachable!("arithmetic operator"),
            };
            let tmp = ctx.func.fresh_tmp();
            ctx.emit(format!(
                "{tmp} = {opcode} double {}, {}",
                left.repr, right.repr
            ));
            return Ok(IrValue::new(IrType::Double, tmp));
        }
        bail!("Operador binario no soportado: {}", op.symbol())
    }

    fn generate_comparison(
        ctx: &mut FnCtx,
        op: BinaryOperator,
        left: &IrValue,
        right: &IrValue,
    ) -> IrValue {
        let instruction = if left.ty.is_double() {
            let predicate = match op {
                BinaryOperator::Lt => "olt",
                BinaryOperator::Le => "ole",
                BinaryOperator::Gt => "ogt",
                BinaryOperator::Ge => "oge",
                BinaryOperator::Eq => "oeq",
                BinaryOperator::Ne => "one",
                _ => unreachable!("comparison operator"),
            };
            format!("fcmp {predicate} double {}, {}", left.repr, right.repr)
        } else {
            let predicate = match op {
                BinaryOperator::Lt => "slt",
                BinaryOperator::Le => "sle",
                BinaryOperator::Gt => "sgt",
                BinaryOperator::Ge => "sge",
                BinaryOperator::Eq => "eq",
                BinaryOperator::Ne => "ne",
                _ => unreachable!("comparison operator"),
            };
            format!("icmp {predicate} {} {}, {}", left.ty, left.repr, right.repr)
        };
        let tmp = ctx.func.fresh_tmp();
        ctx.emit(format!("{tmp} = {instruction}"));
        IrValue::new(IrType::I1, tmp)
    }

    /// `^` always lifts both operands to `double` and calls `pow`.
    fn generate_power(&mut self, ctx: &mut FnCtx, left: IrValue, right: IrValue) -> Result<IrValue> {
        let left = Self::cast_value(ctx, left, &IrType::Double)?;
        let right = Self::cast_value(ctx, right, &IrType::Double)?;
        let tmp = ctx.func.fresh_tmp();
        ctx.emit(format!(
            "{tmp} = call double @pow(double {}, double {})",
            left.repr, right.repr
        ));
        Ok(IrValue::new(IrType::Double, tmp))
    }

    fn generate_unary(&mut self, ctx: &mut FnCtx, unary: &UnaryExpression) -> Result<IrValue> {
        let operand = self.generate_expression(ctx, &unary.operand)?;
        match unary.op {
            UnaryOperator::Pos => Ok(operand),
            UnaryOperator::Neg => {
                if operand.ty.is_int() {
                    let tmp = ctx.func.fresh_tmp();
                    ctx.emit(format!("{tmp} = sub {} 0, {}", operand.ty, operand.repr));
                    Ok(IrValue::new(operand.ty, tmp))
                } else if operand.ty.is_double() {
                    let tmp = ctx.func.fresh_tmp();
                    ctx.emit(format!("{tmp} = fneg double {}", operand.repr));
                    Ok(IrValue::new(IrType::Double, tmp))
                } else {
                    bail!("Operador unario no soportado: - sobre {}", operand.ty)
                }
            }
            UnaryOperator::Not => {
                let value = Self::to_bool(ctx, operand)?;
                let tmp = ctx.func.fresh_tmp();
                ctx.emit(format!("{tmp} = xor i1 {}, true", value.repr));
                Ok(IrValue::new(IrType::I1, tmp))
            }
        }
    }

    // ---- helpers ----------------------------------------------------------

    fn lookup_slot(&self, name: &str) -> Result<Slot> {
        for scope in self.slots.iter().rev() {
            if let Some(slot) = scope.get(name) {
                return Ok(slot.clone());
            }
        }
        bail!("Variable '{name}' no definida")
    }

    /// Reconciles operand widths: any `double` promotes the other side via
    /// `sitofp`; two integers of different width sign-extend the narrower.
    fn match_types(ctx: &mut FnCtx, left: IrValue, right: IrValue) -> (IrValue, IrValue) {
        if left.ty == right.ty {
            return (left, right);
        }
        if left.ty.is_double() || right.ty.is_double() {
            let left = if left.ty.is_int() {
                Self::sitofp(ctx, &left)
            } else {
                left
            };
            let right = if right.ty.is_int() {
                Self::sitofp(ctx, &right)
            } else {
                right
            };
            return (left, right);
        }
        if let (Some(lw), Some(rw)) = (left.ty.int_width(), right.ty.int_width()) {
            if lw > rw {
                let widened = Self::sext(ctx, &right, &left.ty);
                return (left, widened);
            }
            let widened = Self::sext(ctx, &left, &right.ty);
            return (widened, right);
        }
        (left, right)
    }

    fn sitofp(ctx: &mut FnCtx, value: &IrValue) -> IrValue {
        let tmp = ctx.func.fresh_tmp();
        ctx.emit(format!(
            "{tmp} = sitofp {} {} to double",
            value.ty, value.repr
        ));
        IrValue::new(IrType::Double, tmp)
    }

    fn sext(ctx: &mut FnCtx, value: &IrValue, target: &IrType) -> IrValue {
        let tmp = ctx.func.fresh_tmp();
        ctx.emit(format!(
            "{tmp} = sext {} {} to {target}",
            value.ty, value.repr
        ));
        IrValue::new(target.clone(), tmp)
    }

    fn cast_value(ctx: &mut FnCtx, value: IrValue, target: &IrType) -> Result<IrValue> {
        if value.ty == *target {
            return Ok(value);
        }
        if value.ty.is_int() && target.is_double() {
            return Ok(Self::sitofp(ctx, &value));
        }
        if value.ty.is_double() && target.is_int() {
            let tmp = ctx.func.fresh_tmp();
            ctx.emit(format!("{tmp} = fptosi double {} to {target}", value.repr));
            return Ok(IrValue::new(target.clone(), tmp));
        }
        if value.ty.is_int() && target.is_pointer() {
            bail!("Cannot cast integer to pointer directly.");
        }
        if value.ty.is_pointer() && target.is_pointer() {
            let tmp = ctx.func.fresh_tmp();
            ctx.emit(format!(
                "{tmp} = bitcast {} {} to {target}",
                value.ty, value.repr
            ));
            return Ok(IrValue::new(target.clone(), tmp));
        }
        bail!("No suitable cast from {} to {target}", value.ty)
    }

    /// Coerces a value to `i1`: integers compare against 0, doubles against
    /// 0.0, pointers against null.
    fn to_bool(ctx: &mut FnCtx, value: IrValue) -> Result<IrValue> {
        if value.ty == IrType::I1 {
            return Ok(value);
        }
        let tmp = ctx.func.fresh_tmp();
        if value.ty.is_int() {
            ctx.emit(format!("{tmp} = icmp ne {} {}, 0", value.ty, value.repr));
        } else if value.ty.is_double() {
            ctx.emit(format!(
                "{tmp} = fcmp one double {}, {}",
                value.repr,
                format_double(0.0)
            ));
        } else if value.ty.is_pointer() {
            ctx.emit(format!("{tmp} = icmp ne {} {}, null", value.ty, value.repr));
        } else {
            bail!("No suitable cast from {} to i1", value.ty);
        }
        Ok(IrValue::new(IrType::I1, tmp))
    }
}
