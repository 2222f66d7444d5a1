//! Blocks, loops and subroutines.

use std::num::NonZeroI64;

use oqforge::{
    Annotation, Error, ErrorKind, Iterable, NativeType, Operand, Program, Signature, Var, VarType,
    args,
};

#[test]
fn test_bare_if() {
    let i = Var::int("i").with_init(3).unwrap();
    let mut prog = Program::with_version("3.0").unwrap();
    prog.if_(i.le(0), |prog| prog.increment(&i, 1).map(drop))
        .unwrap();
    prog.if_(i.not_equals(0), |prog| prog.set(&i, 0).map(drop))
        .unwrap();

    let err = prog
        .if_(i.lt(0).logical_or(i.equals(0)), |prog| {
            prog.increment(&i, 1).map(drop)
        })
        .unwrap_err();
    assert!(matches!(err, Error::CompoundCondition { .. }));
    assert_eq!(err.kind(), ErrorKind::Runtime);

    insta::assert_snapshot!(prog.render().unwrap(), @r"
    OPENQASM 3.0;
    int[32] i = 3;
    if (i <= 0) {
        i += 1;
    }
    if (i != 0) {
        i = 0;
    }
    ");
}

#[test]
fn test_if_else() {
    let i = Var::int("i").with_init(3).unwrap();
    let j = Var::int("j").with_init(2).unwrap();
    let mut prog = Program::with_version("3.0").unwrap();
    prog.if_(i.ge(0), |prog| {
        prog.if_(j.equals(0), |prog| prog.increment(&i, 1).map(drop))?;
        prog.else_(|prog| prog.decrement(&i, 1).map(drop))?;
        Ok(())
    })
    .unwrap();
    prog.else_(|prog| prog.decrement(&i, 1).map(drop)).unwrap();

    let before = prog.render().unwrap();
    let err = prog
        .else_(|prog| prog.decrement(&i, 1).map(drop))
        .unwrap_err();
    assert!(matches!(err, Error::ElseWithoutIf));
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert_eq!(prog.render().unwrap(), before);

    insta::assert_snapshot!(before, @r"
    OPENQASM 3.0;
    int[32] i = 3;
    int[32] j = 2;
    if (i >= 0) {
        if (j == 0) {
            i += 1;
        } else {
            i -= 1;
        }
    } else {
        i -= 1;
    }
    ");
}

#[test]
fn test_else_if_chain() {
    let i = Var::int("i");
    let mut prog = Program::new();
    prog.if_(i.equals(0), |prog| prog.set(&i, 1).map(drop))
        .unwrap()
        .else_if(i.equals(1), |prog| prog.set(&i, 2).map(drop))
        .unwrap()
        .else_if(i.equals(2), |prog| prog.set(&i, 3).map(drop))
        .unwrap()
        .else_(|prog| prog.set(&i, 0).map(drop))
        .unwrap();

    insta::assert_snapshot!(prog.render().unwrap(), @r"
    int[32] i;
    if (i == 0) {
        i = 1;
    } else if (i == 1) {
        i = 2;
    } else if (i == 2) {
        i = 3;
    } else {
        i = 0;
    }
    ");
}

#[test]
fn test_else_after_other_statement() {
    let i = Var::int("i");
    let mut prog = Program::new();
    prog.if_(i.equals(0), |_| Ok(())).unwrap();
    prog.set(&i, 1).unwrap();
    assert!(matches!(
        prog.else_(|_| Ok(())).unwrap_err(),
        Error::ElseWithoutIf
    ));
    assert!(matches!(
        prog.else_if(i.equals(1), |_| Ok(())).unwrap_err(),
        Error::ElseWithoutIf
    ));
}

#[test]
fn test_for_in() {
    let j = Var::int("j").with_init(0).unwrap();
    let wf = Var::waveform("wf")
        .with_init(vec![0.1, -1.2, 1.3, 2.4])
        .unwrap();
    let mut prog = Program::with_version("3.0").unwrap();
    prog.for_in(0..5, "i", |prog, i| prog.increment(&j, i).map(drop))
        .unwrap();
    prog.for_in([-1, 1, -1, 1], "k", |prog, k| prog.decrement(&j, k).map(drop))
        .unwrap();
    prog.for_in(vec![0, 3], "l", |prog, l| prog.set(&j, l).map(drop))
        .unwrap();
    prog.for_in(&wf, "m", |prog, m| prog.set(&j, m).map(drop))
        .unwrap();
    prog.for_in(
        Iterable::range_step(0, 10, NonZeroI64::new(3).unwrap()),
        "n",
        |prog, n| prog.set(&j, n).map(drop),
    )
    .unwrap();

    insta::assert_snapshot!(prog.render().unwrap(), @r"
    OPENQASM 3.0;
    int[32] j = 0;
    waveform wf = {0.1, -1.2, 1.3, 2.4};
    for int i in [0:4] {
        j += i;
    }
    for int k in {-1, 1, -1, 1} {
        j -= k;
    }
    for int l in {0, 3} {
        j = l;
    }
    for int m in wf {
        j = m;
    }
    for int n in [0:3:9] {
        j = n;
    }
    ");
}

#[test]
fn test_loop_variable_is_scoped() {
    let mut prog = Program::new();
    prog.for_in(0..=2, "i", |prog, i| prog.evaluate(i).map(drop))
        .unwrap();
    // the same name may be reused by a later loop with another type
    let f = Var::float("i");
    prog.for_in(&f, "k", |_, _| Ok(())).unwrap();
    assert_eq!(
        prog.render().unwrap(),
        "float[64] i;\nfor int i in [0:2] {\n    i;\n}\nfor int k in i {\n}"
    );
}

#[test]
fn test_explicit_open_close() {
    let j = Var::int("j").with_init(0).unwrap();
    let mut prog = Program::new();
    prog.open_while(j.lt(5)).unwrap();
    prog.increment(&j, 1).unwrap();
    let i = prog.open_for(0..2, "i").unwrap();
    prog.decrement(&j, &i).unwrap();
    assert_eq!(prog.open_scopes(), 2);
    prog.close().unwrap().close().unwrap();

    let err = prog.close().unwrap_err();
    assert!(matches!(err, Error::NoOpenScope));
    assert_eq!(err.kind(), ErrorKind::Runtime);

    insta::assert_snapshot!(prog.render().unwrap(), @r"
    int[32] j = 0;
    while (j < 5) {
        j += 1;
        for int i in [0:1] {
            j -= i;
        }
    }
    ");
}

#[test]
fn test_while() {
    let j = Var::int("j").with_init(0).unwrap();
    let mut prog = Program::with_version("3.0").unwrap();
    prog.while_(j.lt(5), |prog| prog.increment(&j, 1).map(drop))
        .unwrap();
    prog.while_(j.gt(0), |prog| prog.decrement(&j, 1).map(drop))
        .unwrap();

    insta::assert_snapshot!(prog.render().unwrap(), @r"
    OPENQASM 3.0;
    int[32] j = 0;
    while (j < 5) {
        j += 1;
    }
    while (j > 0) {
        j -= 1;
    }
    ");
}

#[test]
fn test_failed_block_rolls_back() {
    let i = Var::int("i");
    let mut prog = Program::new();
    prog.set(&i, 1).unwrap();
    let err = prog
        .while_(i.lt(3), |prog| {
            prog.increment(&i, 1)?;
            prog.set(&Var::float("i"), 2.0)?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, Error::NameCollision { .. }));
    assert_eq!(prog.open_scopes(), 0);
    assert_eq!(prog.render().unwrap(), "int[32] i;\ni = 1;");
}

#[test]
fn test_unbalanced_closure_body() {
    let mut prog = Program::new();
    let err = prog
        .box_(|prog| prog.open_box().map(drop))
        .unwrap_err();
    assert!(matches!(err, Error::ScopeMismatch { .. }));
    assert_eq!(prog.open_scopes(), 0);
}

#[test]
fn test_subroutine_with_return() {
    let mut prog = Program::with_version("3.0").unwrap();
    let multiply = prog
        .subroutine(
            Signature::new("multiply")
                .param("x", VarType::INT32)
                .param("y", VarType::INT32)
                .returns(VarType::INT32),
            |_, params| Ok(Some(params[0].times(&params[1]))),
        )
        .unwrap();
    let y = Var::int("y").with_init(2).unwrap();
    prog.set(&y, multiply.call(args![&y, 3]).unwrap()).unwrap();

    // defined but never called: no definition is emitted
    let declare = prog
        .subroutine(Signature::new("declare").param("x", VarType::INT32), |prog, params| {
            prog.declare(&params[0])?;
            Ok(None)
        })
        .unwrap();
    let _unused = declare.call(args![&y]).unwrap();

    let err = prog
        .subroutine(
            Signature::new("return1").returns(NativeType::Float),
            |_, _| Ok(Some(1.0.into())),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidReturnType { .. }));
    assert_eq!(err.kind(), ErrorKind::Value);

    let err = prog
        .subroutine(
            Signature::new("add")
                .param("x", VarType::INT32)
                .param("y", Annotation::Missing)
                .returns(VarType::INT32),
            |_, params| Ok(Some(params[0].plus(&params[1]))),
        )
        .unwrap_err();
    assert!(matches!(err, Error::UntypedParameter { ref param, .. } if param == "y"));
    assert_eq!(err.kind(), ErrorKind::Value);

    insta::assert_snapshot!(prog.render().unwrap(), @r"
    OPENQASM 3.0;
    def multiply(int[32] x, int[32] y) -> int[32] {
        return x * y;
    }
    int[32] y = 2;
    y = multiply(y, 3);
    ");
}

#[test]
fn test_subroutine_body_statements() {
    let q = Var::physical_qubit(0);
    let mut prog = Program::new();
    let settle = prog
        .subroutine(
            Signature::new("settle").param("q", VarType::Qubit),
            |prog, params| {
                prog.delay(50e-9, &params[0])?;
                Ok(None)
            },
        )
        .unwrap();
    prog.evaluate(settle.call(args![&q]).unwrap()).unwrap();
    prog.evaluate(settle.call(args![q = &q]).unwrap()).unwrap();

    insta::assert_snapshot!(prog.render().unwrap(), @r"
    def settle(qubit q) {
        delay[50.0ns] q;
    }
    settle($0);
    settle($0);
    ");

    let err = settle.call(args![&q, &q]).unwrap_err();
    assert!(matches!(err, Error::ArgumentCount { .. }));
    assert_eq!(err.kind(), ErrorKind::Type);
}

#[test]
fn test_subroutine_local_declaration_keeps_top_level_one() {
    let x = Var::int("x");
    let mut prog = Program::new();
    prog.set(&x, 1).unwrap();
    let f = prog
        .subroutine(Signature::new("f").param("a", VarType::INT32), |prog, _| {
            prog.declare(&x)?;
            Ok(None)
        })
        .unwrap();
    prog.evaluate(f.call(args![1]).unwrap()).unwrap();

    insta::assert_snapshot!(prog.render().unwrap(), @r"
    def f(int[32] a) {
        int[32] x;
    }
    int[32] x;
    x = 1;
    f(1);
    ");
}

#[test]
fn test_box_and_timings() {
    let constant = oqforge::Extern::waveform_generator(
        "constant",
        [("length", VarType::Duration), ("iq", VarType::COMPLEX128)],
    );
    let port = Var::port("portname");
    let frame = Var::new_frame("framename", &port, 1e9).unwrap();
    let mut prog = Program::with_version("3.0").unwrap();
    prog.box_for(500e-9, |prog| {
        prog.play(&frame, constant.call(args![100e-9, 0.5])?)?;
        prog.delay(200e-7, &frame)?;
        prog.play(&frame, constant.call(args![100e-9, 0.5])?)?;
        Ok(())
    })
    .unwrap();
    prog.box_(|prog| {
        prog.play(&frame, constant.call(args![200e-9, 0.5])?)?;
        Ok(())
    })
    .unwrap();

    let f = Var::float("f").with_init(200e-9).unwrap().without_declaration();
    assert_eq!(
        oqforge::make_duration(&f).unwrap_err().kind(),
        ErrorKind::Type
    );

    insta::assert_snapshot!(prog.render().unwrap(), @r"
    OPENQASM 3.0;
    extern constant(duration, complex[float[64]]) -> waveform;
    port portname;
    frame framename = newframe(portname, 1000000000.0, 0);
    box[500.0ns] {
        play(framename, constant(100.0ns, 0.5));
        delay[20000.0ns] framename;
        play(framename, constant(100.0ns, 0.5));
    }
    box {
        play(framename, constant(200.0ns, 0.5));
    }
    ");
}
