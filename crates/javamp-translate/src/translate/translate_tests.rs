use indoc::indoc;
use pretty_assertions::assert_eq;

use javamp_core::VarKind;

use super::{Config, Translation, translate_unit};
use crate::diagnostics::Diagnostics;
use crate::Error;

fn translate(source: &str) -> (Translation, Diagnostics) {
    translate_unit(source, &Config::default()).expect("translation must succeed")
}

fn captured_names(translation: &Translation, directive: usize) -> Vec<String> {
    translation.directives[directive]
        .captured
        .iter()
        .map(|v| v.name.clone())
        .collect()
}

#[test]
fn captures_a_local() {
    let source = indoc! {r#"
        class C {
            void work() {
                int x = 0;
                // omp parallel threadNum(2)
                x = x + 1;
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(t.text.contains("javampCtx_1.L_0_x = javampCtx_1.L_0_x + 1;"), "{}", t.text);
    assert!(t.text.contains("final int javampNth_1 = 2;"));
    assert!(t.text.contains("public int L_0_x;"));
    assert!(t.text.contains("javampCtx_1.L_0_x = x;"));
    assert!(t.text.contains("x = javampCtx_1.L_0_x;"));
    assert!(t.text.contains("class JavampExecutor {"));
    assert!(!t.text.contains("// omp"), "pragma must be consumed");
    assert_eq!(captured_names(&t, 0), vec!["x".to_owned()]);
    assert!(!t.directives[0].captured_this);
}

#[test]
fn privatized_names_index_by_worker() {
    let source = indoc! {r#"
        class C {
            void work(int[] a) {
                int sum = 0;
                int i = 0;
                // omp parallel private(sum)
                sum += a[i];
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(
        t.text.contains(
            "javampCtx_1.L_0_sum[javampExec_1.getThreadNum()] += javampCtx_1.P_0_a[javampCtx_1.L_0_i];"
        ),
        "{}",
        t.text
    );
    assert!(t.text.contains("public int[] L_0_sum = new int[javampNth_1];"));
    assert_eq!(captured_names(&t, 0), vec!["sum".to_owned(), "a".to_owned(), "i".to_owned()]);
    // Private slots get no copy-in and no write-back.
    assert!(!t.text.contains("javampCtx_1.L_0_sum = sum"));
    assert!(!t.text.contains("sum = javampCtx_1.L_0_sum"));
}

#[test]
fn this_field_goes_through_the_context() {
    let source = indoc! {r#"
        class C {
            int count;
            void work() {
                // omp parallel
                this.count++;
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(t.text.contains("javampCtx_1.F_0_count++;"), "{}", t.text);
    assert!(t.text.contains("public C THAT;"));
    assert!(t.text.contains("javampCtx_1.THAT = this;"));
    assert!(t.text.contains("javampCtx_1.F_0_count = this.count;"));
    assert!(t.text.contains("this.count = javampCtx_1.F_0_count;"));
    assert!(t.directives[0].captured_this);
    let captured = &t.directives[0].captured;
    assert_eq!(captured.len(), 1);
    assert!(matches!(captured[0].kind, VarKind::Field(_)));
}

#[test]
fn method_call_on_enclosing_object() {
    let source = indoc! {r#"
        class C {
            void doIt() {
            }
            void work() {
                // omp parallel
                this.doIt();
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(t.text.contains("javampCtx_1.THAT.doIt();"), "{}", t.text);
    assert!(t.directives[0].captured_this);
    assert!(t.directives[0].captured.is_empty());
}

#[test]
fn nested_team_recaptures_through_parent_context() {
    let source = indoc! {r#"
        class C {
            void work() {
                int x = 0;
                // omp parallel
                {
                    x = x + 1;
                    int y = 0;
                    // omp parallel
                    {
                        x = x + 2;
                        y = y + 1;
                    }
                }
            }
        }
    "#};
    let (t, _) = translate(source);
    // The inner region references the outer context for `x`...
    assert!(t.text.contains("javampCtx_1.L_0_x = javampCtx_1.L_0_x + 2;"), "{}", t.text);
    // ...and captures only what the outer region declared.
    assert!(t.text.contains("javampCtx_2.L_0_y = javampCtx_2.L_0_y + 1;"));
    assert!(t.text.contains("javampCtx_2.L_0_y = y;"));
    assert_eq!(captured_names(&t, 0), vec!["x".to_owned()]);
    assert_eq!(captured_names(&t, 1), vec!["y".to_owned()]);
}

#[test]
fn anonymous_class_this_is_untouched() {
    let source = indoc! {r#"
        class C {
            void work() {
                int x = 0;
                // omp parallel
                {
                    Runnable r = new Runnable() {
                        public void run() {
                            this.toString();
                            x++;
                        }
                    };
                    r.run();
                }
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(t.text.contains("this.toString();"), "{}", t.text);
    assert!(t.text.contains("javampCtx_1.L_0_x++;"));
    assert!(t.text.contains("r.run();"));
    assert!(!t.directives[0].captured_this);
    assert_eq!(captured_names(&t, 0), vec!["x".to_owned()]);
}

#[test]
fn parallel_for_interleaves_iterations() {
    let source = indoc! {r#"
        class C {
            void work(int n) {
                int sum = 0;
                // omp parallel for threadNum(4) reduction(+: sum)
                for (int i = 0; i < n; i++) {
                    sum += i;
                }
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(
        t.text.contains(
            "for (int i = 0 + javampTid_1 * (1); i < javampCtx_1.P_0_n; i += javampNth_1 * (1))"
        ),
        "{}",
        t.text
    );
    assert!(t.text.contains("final int javampTid_1 = javampExec_1.getThreadNum();"));
    assert!(t.text.contains("java.util.Arrays.fill(javampCtx_1.L_0_sum, 0);"));
    assert!(t.text.contains("javampCtx_1.L_0_sum[javampExec_1.getThreadNum()] += i;"));
    assert!(t.text.contains(
        "for (int javampT_1 = 0; javampT_1 < javampNth_1; javampT_1++) { sum = sum + javampCtx_1.L_0_sum[javampT_1]; }"
    ));
    // The loop variable is a region-local.
    assert_eq!(captured_names(&t, 0), vec!["n".to_owned(), "sum".to_owned()]);
}

#[test]
fn worksharing_wrappers_inside_a_team() {
    let source = indoc! {r#"
        class C {
            void work() {
                int done = 0;
                // omp parallel threadNum(2)
                {
                    // omp single
                    { done = 1; }
                    // omp critical
                    { done = done + 1; }
                    // omp barrier
                    done = done + 2;
                }
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(t.text.contains("if (javampExec_1.getThreadNum() == 0) {"), "{}", t.text);
    assert!(t.text.contains("synchronized (javampCtx_1) {"));
    assert!(t.text.contains("javampBarrier_1.await();"));
    assert!(t.text.contains("new java.util.concurrent.CyclicBarrier(javampNth_1)"));
    assert!(t.text.contains("javampCtx_1.L_0_done = javampCtx_1.L_0_done + 2;"));
}

#[test]
fn sections_distribute_round_robin() {
    let source = indoc! {r#"
        class C {
            void a() {}
            void b() {}
            void work() {
                // omp parallel threadNum(2)
                {
                    // omp sections
                    {
                        // omp section
                        { a(); }
                        // omp section
                        { b(); }
                    }
                }
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(t.text.contains("if (javampExec_1.getThreadNum() == 0 % javampNth_1) {"), "{}", t.text);
    assert!(t.text.contains("if (javampExec_1.getThreadNum() == 1 % javampNth_1) {"));
    assert!(t.text.contains("javampBarrier_1.await();"));
}

#[test]
fn nested_for_uses_team_executor() {
    let source = indoc! {r#"
        class C {
            void work(int n) {
                // omp parallel threadNum(2)
                {
                    // omp for
                    for (int i = 0; i < n; i += 2) {
                        touch(i);
                    }
                }
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(
        t.text.contains("int i = 0 + javampExec_1.getThreadNum() * (2)"),
        "{}",
        t.text
    );
    assert!(t.text.contains("i += javampNth_1 * (2)"));
    assert!(t.text.contains("javampBarrier_1.await();"));
}

#[test]
fn local_shadowing_a_field_stays_local() {
    let source = indoc! {r#"
        class C {
            int count;
            void work() {
                int count = 5;
                // omp parallel
                count = count + 1;
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(t.text.contains("javampCtx_1.L_0_count = javampCtx_1.L_0_count + 1;"), "{}", t.text);
    assert!(matches!(t.directives[0].captured[0].kind, VarKind::Local));
}

#[test]
fn dotted_name_rewrites_only_the_leftmost_identifier() {
    let source = indoc! {r#"
        class Point {
            int x;
        }

        class C {
            void work(Point p) {
                // omp parallel
                p.x = p.x + 1;
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(t.text.contains("javampCtx_1.P_1_p.x = javampCtx_1.P_1_p.x + 1;"), "{}", t.text);
}

#[test]
fn region_local_declared_after_use_is_not_captured() {
    let source = indoc! {r#"
        class C {
            void work() {
                int tmp = 9;
                // omp parallel
                {
                    int first = tmp + 1;
                    int tmp = 0;
                }
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(!t.text.contains("L_0_tmp"), "{}", t.text);
    assert!(t.directives[0].captured.is_empty());
}

#[test]
fn firstprivate_and_write_back_flags() {
    let source = indoc! {r#"
        class C {
            void work(int seed) {
                final int base = 3;
                int out = 0;
                // omp parallel firstprivate(seed)
                out = base + seed;
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(t.text.contains("java.util.Arrays.fill(javampCtx_1.P_0_seed, seed);"), "{}", t.text);
    assert!(t.text.contains("javampCtx_1.P_0_seed[javampExec_1.getThreadNum()]"));
    // Shared write-back happens for `out` but not for the final local.
    assert!(t.text.contains("out = javampCtx_1.L_0_out;"));
    assert!(!t.text.contains("base = javampCtx_1.L_0_base;"));
}

#[test]
fn no_pragmas_is_byte_identical() {
    let source = indoc! {r#"
        class C {
            // plain comment stays
            void work() {
                int x = 0; /* and this one */
                x++;
            }
        }
    "#};
    let (t, diags) = translate(source);
    assert_eq!(t.text, source);
    assert!(diags.is_empty());
    assert!(t.directives.is_empty());
    assert!(!t.text.contains("JavampExecutor"));
}

#[test]
fn translation_is_deterministic() {
    let source = indoc! {r#"
        class C {
            void work() {
                int x = 0;
                // omp parallel threadNum(2)
                x = x + 1;
            }
        }
    "#};
    let (a, _) = translate(source);
    let (b, _) = translate(source);
    assert_eq!(a.text, b.text);
}

#[test]
fn default_thread_count_comes_from_config_or_runtime() {
    let source = indoc! {r#"
        class C {
            void work() {
                int x = 0;
                // omp parallel
                x = x + 1;
            }
        }
    "#};
    let (t, _) = translate(source);
    assert!(t.text.contains("final int javampNth_1 = Runtime.getRuntime().availableProcessors();"));

    let config = Config {
        default_num_threads: Some(3),
    };
    let (t, _) = translate_unit(source, &config).unwrap();
    assert!(t.text.contains("final int javampNth_1 = 3;"));
}

#[test]
fn unreferenced_privatized_name_warns() {
    let source = indoc! {r#"
        class C {
            void work() {
                int x = 0;
                // omp parallel private(ghost)
                x = x + 1;
            }
        }
    "#};
    let (_, diags) = translate(source);
    assert!(!diags.has_errors());
    assert!(
        diags
            .iter()
            .any(|d| d.message.contains("`ghost` was not captured")),
        "{diags:?}"
    );
}

#[test]
fn orphaned_worksharing_directive_fails_the_unit() {
    let source = indoc! {r#"
        class C {
            void work(int n) {
                // omp for
                for (int i = 0; i < n; i++) {
                }
            }
        }
    "#};
    let err = translate_unit(source, &Config::default()).unwrap_err();
    let Error::Translate(diags) = err else {
        panic!("expected Translate, got {err}");
    };
    assert!(
        diags
            .iter()
            .any(|d| d.message.contains("must be nested inside a parallel region"))
    );
}

#[test]
fn non_canonical_loop_is_unsupported() {
    let source = indoc! {r#"
        class C {
            boolean ok(int i) { return true; }
            int next(int i) { return i + 1; }
            void work() {
                // omp parallel for
                for (int i = 0; ok(i); i = next(i)) {
                }
            }
        }
    "#};
    let err = translate_unit(source, &Config::default()).unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }), "{err}");
}

#[test]
fn stacked_pragmas_are_rejected() {
    let source = indoc! {r#"
        class C {
            void work() {
                // omp parallel
                // omp single
                work();
            }
        }
    "#};
    let err = translate_unit(source, &Config::default()).unwrap_err();
    let Error::Translate(diags) = err else {
        panic!("expected Translate");
    };
    assert!(diags.iter().any(|d| d.message.contains("already carries a directive")));
}

#[test]
fn trailing_pragma_without_statement_fails() {
    let source = indoc! {r#"
        class C {
            void work() {
                int x = 0;
                // omp parallel
            }
        }
    "#};
    let err = translate_unit(source, &Config::default()).unwrap_err();
    let Error::Translate(diags) = err else {
        panic!("expected Translate");
    };
    assert!(diags.iter().any(|d| d.message.contains("not followed by a statement")));
}

#[test]
fn return_inside_a_region_fails() {
    let source = indoc! {r#"
        class C {
            int work() {
                // omp parallel
                {
                    return 1;
                }
            }
        }
    "#};
    let err = translate_unit(source, &Config::default()).unwrap_err();
    let Error::Translate(diags) = err else {
        panic!("expected Translate");
    };
    assert!(diags.iter().any(|d| d.message.contains("may not leave a parallel region")));
}

#[test]
fn malformed_pragma_fails_loudly() {
    let source = indoc! {r#"
        class C {
            void work() {
                // omp parallel private(
                work();
            }
        }
    "#};
    assert!(translate_unit(source, &Config::default()).is_err());
}

#[test]
fn grammar_errors_are_parse_errors() {
    let err = translate_unit("class {", &Config::default()).unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "{err}");
}
