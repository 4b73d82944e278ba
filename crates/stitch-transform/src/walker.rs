//! The statement walker: descends function bodies, tracks lexical scope,
//! and plans the injection edits.
//!
//! Scope tracking is textual-lexical: every binding a pattern introduces is
//! pushed onto a stack delimited by block entry/exit snapshots, so a name is
//! "in scope" at an injection point iff its declaration precedes the point
//! inside an enclosing open block (or the function's parameter list).
//! Shadowed names collapse to one capture entry; the borrow resolves to the
//! innermost binding.

use std::collections::{BTreeMap, BTreeSet};

use proc_macro2::Span;
use stitch_edit::{Edit, EditSet, LineIndex};
use syn::spanned::Spanned;

use crate::globals::Global;
use crate::header::RUNTIME_ALIAS;

enum Marker {
    Breakpoint,
    StepMode,
}

enum CallSite<'t> {
    Break,
    Step { line_text: &'t str },
}

pub(crate) struct Walker<'a> {
    source: &'a str,
    lines: &'a LineIndex,
    file_path: &'a str,
    file_hash: u32,
    globals: &'a [Global],
    step_mode: bool,
    edits: EditSet,
    scope: Vec<String>,
    function: String,
    injected_in_function: bool,
    pending_discards: BTreeMap<u32, Edit>,
    injection_lines: BTreeSet<u32>,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(
        source: &'a str,
        lines: &'a LineIndex,
        file_path: &'a str,
        file_hash: u32,
        globals: &'a [Global],
        step_mode: bool,
    ) -> Self {
        Self {
            source,
            lines,
            file_path,
            file_hash,
            globals,
            step_mode,
            edits: EditSet::new(),
            scope: Vec::new(),
            function: String::new(),
            injected_in_function: false,
            pending_discards: BTreeMap::new(),
            injection_lines: BTreeSet::new(),
        }
    }

    pub(crate) fn walk_file(&mut self, file: &syn::File) {
        for item in &file.items {
            self.walk_item(item);
        }
    }

    /// The planned edits and the set of lines found to carry injectable
    /// statements.
    pub(crate) fn finish(self) -> (EditSet, BTreeSet<u32>) {
        (self.edits, self.injection_lines)
    }

    fn walk_item(&mut self, item: &syn::Item) {
        match item {
            syn::Item::Fn(func) => {
                // Constant-evaluation guard: const fns are never instrumented.
                if func.sig.constness.is_none() {
                    self.walk_function(
                        func.sig.ident.to_string(),
                        &func.sig.inputs,
                        &func.block,
                    );
                }
            }
            syn::Item::Mod(module) => {
                if let Some((_, items)) = &module.content {
                    for item in items {
                        self.walk_item(item);
                    }
                }
            }
            syn::Item::Impl(imp) => {
                for member in &imp.items {
                    if let syn::ImplItem::Fn(method) = member {
                        if method.sig.constness.is_none() {
                            self.walk_function(
                                method.sig.ident.to_string(),
                                &method.sig.inputs,
                                &method.block,
                            );
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn walk_function(
        &mut self,
        name: String,
        inputs: &syn::punctuated::Punctuated<syn::FnArg, syn::Token![,]>,
        block: &syn::Block,
    ) {
        let saved_function = std::mem::replace(&mut self.function, name);
        let saved_injected = std::mem::replace(&mut self.injected_in_function, false);
        let saved_pending = std::mem::take(&mut self.pending_discards);
        // A nested fn cannot reference the enclosing function's locals, so
        // it starts from an empty scope (unlike closures, which keep it).
        let saved_scope = std::mem::take(&mut self.scope);

        for input in inputs {
            if let syn::FnArg::Typed(arg) = input {
                collect_pat_idents(&arg.pat, &mut self.scope);
            }
        }
        self.walk_block(block);
        self.scope = saved_scope;

        // Two-phase discard commit: deletions apply only when this function
        // actually received instrumentation, so pass-through files keep
        // their discards.
        let commit = self.injected_in_function;
        let pending = std::mem::replace(&mut self.pending_discards, saved_pending);
        if commit {
            for (line, edit) in pending {
                if let Some((start, end)) = self.lines.line_span_with_newline(line) {
                    if self.edits.touches_range(start, end) {
                        continue;
                    }
                    self.edits.push(edit);
                }
            }
        }

        self.function = saved_function;
        self.injected_in_function = saved_injected;
    }

    fn walk_block(&mut self, block: &syn::Block) {
        let mark = self.scope.len();
        for stmt in &block.stmts {
            self.walk_stmt(stmt);
        }
        self.scope.truncate(mark);
    }

    fn walk_stmt(&mut self, stmt: &syn::Stmt) {
        match stmt {
            syn::Stmt::Macro(stmt_macro) => match marker_kind(&stmt_macro.mac.path) {
                Some(Marker::Breakpoint) => self.plan_breakpoint(stmt_macro.span()),
                Some(Marker::StepMode) => {
                    self.step_mode = true;
                    self.plan_line_deletion(stmt_macro.span());
                }
                None => self.plan_step(stmt.span()),
            },
            syn::Stmt::Local(local) => {
                if let Some(name) = discard_target_local(local) {
                    if self.is_tracked(&name) {
                        self.stage_discard(stmt.span());
                        return;
                    }
                }
                if local.init.is_some() {
                    self.plan_step(stmt.span());
                }
                if let Some(init) = &local.init {
                    self.walk_expr(&init.expr);
                    if let Some((_, diverge)) = &init.diverge {
                        self.walk_expr(diverge);
                    }
                }
                collect_pat_idents(&local.pat, &mut self.scope);
            }
            syn::Stmt::Item(item) => self.walk_item(item),
            syn::Stmt::Expr(expr, _) => {
                if let Some(name) = discard_target_assign(expr) {
                    if self.is_tracked(&name) {
                        self.stage_discard(stmt.span());
                        return;
                    }
                }
                if is_injectable_expr(expr) {
                    self.plan_step(stmt.span());
                }
                self.walk_expr(expr);
            }
        }
    }

    /// Descend into every compound form an expression can hide statements
    /// in. Scope snapshots bracket every binding-introducing construct.
    fn walk_expr(&mut self, expr: &syn::Expr) {
        match expr {
            syn::Expr::If(e) => {
                let mark = self.scope.len();
                if let syn::Expr::Let(let_expr) = &*e.cond {
                    self.walk_expr(&let_expr.expr);
                    collect_pat_idents(&let_expr.pat, &mut self.scope);
                } else {
                    self.walk_expr(&e.cond);
                }
                self.walk_block(&e.then_branch);
                self.scope.truncate(mark);
                if let Some((_, else_expr)) = &e.else_branch {
                    self.walk_expr(else_expr);
                }
            }
            syn::Expr::While(e) => {
                let mark = self.scope.len();
                if let syn::Expr::Let(let_expr) = &*e.cond {
                    self.walk_expr(&let_expr.expr);
                    collect_pat_idents(&let_expr.pat, &mut self.scope);
                } else {
                    self.walk_expr(&e.cond);
                }
                self.walk_block(&e.body);
                self.scope.truncate(mark);
            }
            syn::Expr::ForLoop(e) => {
                self.walk_expr(&e.expr);
                let mark = self.scope.len();
                collect_pat_idents(&e.pat, &mut self.scope);
                self.walk_block(&e.body);
                self.scope.truncate(mark);
            }
            syn::Expr::Loop(e) => self.walk_block(&e.body),
            syn::Expr::Match(e) => {
                self.walk_expr(&e.expr);
                for arm in &e.arms {
                    let mark = self.scope.len();
                    collect_pat_idents(&arm.pat, &mut self.scope);
                    self.walk_expr(&arm.body);
                    self.scope.truncate(mark);
                }
            }
            syn::Expr::Block(e) => self.walk_block(&e.block),
            syn::Expr::Unsafe(e) => self.walk_block(&e.block),
            syn::Expr::Async(e) => self.walk_block(&e.block),
            syn::Expr::TryBlock(e) => self.walk_block(&e.block),
            syn::Expr::Closure(e) => {
                let mark = self.scope.len();
                for pat in &e.inputs {
                    collect_pat_idents(pat, &mut self.scope);
                }
                self.walk_expr(&e.body);
                self.scope.truncate(mark);
            }
            syn::Expr::Call(e) => {
                self.walk_expr(&e.func);
                for arg in &e.args {
                    self.walk_expr(arg);
                }
            }
            syn::Expr::MethodCall(e) => {
                self.walk_expr(&e.receiver);
                for arg in &e.args {
                    self.walk_expr(arg);
                }
            }
            syn::Expr::Assign(e) => {
                self.walk_expr(&e.left);
                self.walk_expr(&e.right);
            }
            syn::Expr::Binary(e) => {
                self.walk_expr(&e.left);
                self.walk_expr(&e.right);
            }
            syn::Expr::Unary(e) => self.walk_expr(&e.expr),
            syn::Expr::Paren(e) => self.walk_expr(&e.expr),
            syn::Expr::Group(e) => self.walk_expr(&e.expr),
            syn::Expr::Reference(e) => self.walk_expr(&e.expr),
            syn::Expr::Try(e) => self.walk_expr(&e.expr),
            syn::Expr::Await(e) => self.walk_expr(&e.base),
            syn::Expr::Field(e) => self.walk_expr(&e.base),
            syn::Expr::Index(e) => {
                self.walk_expr(&e.expr);
                self.walk_expr(&e.index);
            }
            syn::Expr::Return(e) => {
                if let Some(inner) = &e.expr {
                    self.walk_expr(inner);
                }
            }
            syn::Expr::Break(e) => {
                if let Some(inner) = &e.expr {
                    self.walk_expr(inner);
                }
            }
            _ => {}
        }
    }

    fn is_tracked(&self, name: &str) -> bool {
        self.scope.iter().any(|n| n == name)
            || self.globals.iter().any(|g| g.capturable && g.name == name)
    }

    fn stage_discard(&mut self, span: Span) {
        let line = span.start().line as u32;
        if let Some((start, end)) = self.lines.line_span_with_newline(line) {
            self.pending_discards
                .entry(line)
                .or_insert_with(|| Edit::delete(start, end - start));
        }
    }

    fn plan_line_deletion(&mut self, span: Span) {
        let line = span.start().line as u32;
        if let Some((start, end)) = self.lines.line_span_with_newline(line) {
            self.edits.push(Edit::delete(start, end - start));
            self.injection_lines.insert(line);
        }
    }

    fn plan_breakpoint(&mut self, span: Span) {
        let line = span.start().line as u32;
        let (Some(start), Some(end), Some(text)) = (
            self.lines.line_start(line),
            self.lines.line_end(line, self.source),
            self.lines.line_text(line, self.source),
        ) else {
            return;
        };
        let indent = leading_whitespace(text);
        let call = self.guarded_call(&CallSite::Break, line);

        // A marker alone on its line replaces the whole line; a marker
        // sharing the line with other code replaces only its own span.
        match self.byte_span(span) {
            Some((m_start, m_end)) if m_end <= end => {
                let alone = self.source[start..m_start].trim().is_empty()
                    && self.source[m_end..end].trim().is_empty();
                if alone {
                    self.edits
                        .push(Edit::replace(start, end - start, format!("{indent}{call}")));
                } else {
                    self.edits.push(Edit::replace(m_start, m_end - m_start, call));
                }
            }
            Some((m_start, m_end)) => {
                // Marker formatted across lines: replace exactly its span.
                self.edits.push(Edit::replace(m_start, m_end - m_start, call));
            }
            None => {
                self.edits.push(Edit::replace(start, end - start, format!("{indent}{call}")));
            }
        }
        self.injection_lines.insert(line);
        self.injected_in_function = true;
    }

    fn plan_step(&mut self, span: Span) {
        let line = span.start().line as u32;
        if self.injection_lines.contains(&line) {
            return;
        }
        self.injection_lines.insert(line);
        if !self.step_mode {
            return;
        }
        let (Some(offset), Some(text)) =
            (self.lines.line_start(line), self.lines.line_text(line, self.source))
        else {
            return;
        };
        // Re-running over instrumented output must not double-inject: skip
        // guard lines themselves, and statements already guarded by the
        // line above.
        if text.contains(RUNTIME_ALIAS) {
            self.injection_lines.remove(&line);
            return;
        }
        if line > 1
            && self
                .lines
                .line_text(line - 1, self.source)
                .is_some_and(|prev| prev.contains(RUNTIME_ALIAS))
        {
            return;
        }
        // Only statements that begin their line are step-injectable;
        // mid-line statements (`} else { foo(); }`) cannot take a line
        // inserted above them.
        let column = span.start().column;
        match self.lines.offset_at(line, column, self.source) {
            Some(stmt_offset) if self.source[offset..stmt_offset].trim().is_empty() => {}
            _ => return,
        }

        let indent = leading_whitespace(text);
        let call = self.guarded_call(&CallSite::Step { line_text: text.trim() }, line);
        self.edits.push(Edit::insert(offset, format!("{indent}{call}\n")));
        self.injected_in_function = true;
    }

    fn byte_span(&self, span: Span) -> Option<(usize, usize)> {
        let start = span.start();
        let end = span.end();
        let s = self.lines.offset_at(start.line as u32, start.column, self.source)?;
        let e = self.lines.offset_at(end.line as u32, end.column, self.source)?;
        (s <= e).then_some((s, e))
    }

    /// Names captured at an injection point: lexical scope in declaration
    /// order (shadowed duplicates collapsed), then the file's capturable
    /// globals.
    fn capture_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in &self.scope {
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        }
        for global in self.globals {
            if global.capturable && !names.iter().any(|n| n == &global.name) {
                names.push(global.name.clone());
            }
        }
        names
    }

    fn guarded_call(&self, site: &CallSite<'_>, line: u32) -> String {
        let names = self.capture_names();
        let names_lit =
            names.iter().map(|n| format!("\"{n}\"")).collect::<Vec<_>>().join(", ");
        let values_lit =
            names.iter().map(|n| format!("&{n}")).collect::<Vec<_>>().join(", ");
        let alias = RUNTIME_ALIAS;
        let hash = self.file_hash;
        let function = &self.function;
        match site {
            CallSite::Break => format!(
                "if {alias}::should_break({hash}u32, {line}u32) {{ \
                 {alias}::on_break({function:?}, {path:?}, {hash}u32, {line}u32, \
                 &[{names_lit}], &[{values_lit}]); }}",
                path = self.file_path,
            ),
            CallSite::Step { line_text } => format!(
                "if {alias}::should_break({hash}u32, {line}u32) {{ \
                 {alias}::handle_step_before({function:?}, {text:?}, {path:?}, \
                 {hash}u32, {line}u32, &[{names_lit}], &[{values_lit}]); }}",
                text = line_text,
                path = self.file_path,
            ),
        }
    }
}

fn leading_whitespace(text: &str) -> String {
    text.chars().take_while(|c| *c == ' ' || *c == '\t').collect()
}

fn marker_kind(path: &syn::Path) -> Option<Marker> {
    let last = path.segments.last()?;
    if last.ident == "breakpoint" {
        Some(Marker::Breakpoint)
    } else if last.ident == "step_mode" {
        Some(Marker::StepMode)
    } else {
        None
    }
}

fn path_ident(expr: &syn::Expr) -> Option<String> {
    if let syn::Expr::Path(path) = expr {
        if path.qself.is_none() && path.path.segments.len() == 1 {
            return Some(path.path.segments[0].ident.to_string());
        }
    }
    None
}

/// `let _ = NAME;`
fn discard_target_local(local: &syn::Local) -> Option<String> {
    if !matches!(local.pat, syn::Pat::Wild(_)) {
        return None;
    }
    path_ident(&local.init.as_ref()?.expr)
}

/// `_ = NAME;`
fn discard_target_assign(expr: &syn::Expr) -> Option<String> {
    let syn::Expr::Assign(assign) = expr else {
        return None;
    };
    if !matches!(*assign.left, syn::Expr::Infer(_)) {
        return None;
    }
    path_ident(&assign.right)
}

fn is_injectable_expr(expr: &syn::Expr) -> bool {
    matches!(
        expr,
        syn::Expr::Assign(_)
            | syn::Expr::Binary(_)
            | syn::Expr::Call(_)
            | syn::Expr::MethodCall(_)
            | syn::Expr::Macro(_)
            | syn::Expr::Return(_)
            | syn::Expr::Break(_)
            | syn::Expr::Continue(_)
            | syn::Expr::If(_)
            | syn::Expr::While(_)
            | syn::Expr::ForLoop(_)
            | syn::Expr::Loop(_)
            | syn::Expr::Match(_)
            | syn::Expr::Try(_)
            | syn::Expr::Await(_)
            | syn::Expr::Field(_)
            | syn::Expr::Index(_)
            | syn::Expr::Unary(_)
            | syn::Expr::Paren(_)
    )
}

fn collect_pat_idents(pat: &syn::Pat, out: &mut Vec<String>) {
    match pat {
        syn::Pat::Ident(p) => {
            let name = p.ident.to_string();
            if name != "self" {
                out.push(name);
            }
            if let Some((_, sub)) = &p.subpat {
                collect_pat_idents(sub, out);
            }
        }
        syn::Pat::Tuple(t) => {
            for elem in &t.elems {
                collect_pat_idents(elem, out);
            }
        }
        syn::Pat::TupleStruct(ts) => {
            for elem in &ts.elems {
                collect_pat_idents(elem, out);
            }
        }
        syn::Pat::Struct(s) => {
            for field in &s.fields {
                collect_pat_idents(&field.pat, out);
            }
        }
        syn::Pat::Slice(s) => {
            for elem in &s.elems {
                collect_pat_idents(elem, out);
            }
        }
        syn::Pat::Reference(r) => collect_pat_idents(&r.pat, out),
        syn::Pat::Type(t) => collect_pat_idents(&t.pat, out),
        syn::Pat::Paren(p) => collect_pat_idents(&p.pat, out),
        syn::Pat::Or(o) => {
            // Alternatives bind the same names; the first case suffices.
            if let Some(first) = o.cases.first() {
                collect_pat_idents(first, out);
            }
        }
        _ => {}
    }
}
