mod common;

use common::check;

#[test]
fn globals() {
    const CODE: &str = r#"let a = "a";
let b;
print(a, b); // expect: a nil
b = a + "b";
print(b); // expect: ab
"#;
    check(CODE);
}

#[test]
fn undefined_global_read() {
    const CODE: &str = r#"print(missing); // expect runtime error: name `missing` is not defined
"#;
    check(CODE);
}

#[test]
fn undefined_global_assignment() {
    const CODE: &str = r#"missing = 1; // expect runtime error: name `missing` is not defined
"#;
    check(CODE);
}

#[test]
fn global_redefinition() {
    const CODE: &str = r#"let x = 1;
print(x); // expect: 1
let x = 2; // expect runtime error: name `x` is redefined
"#;
    check(CODE);
}

#[test]
fn locals_shadow_globals() {
    const CODE: &str = r#"let name = "global";
{
  let name = "local";
  print(name); // expect: local
  {
    let name = "inner";
    print(name); // expect: inner
  }
  print(name); // expect: local
}
print(name); // expect: global
"#;
    check(CODE);
}

#[test]
fn functions_read_globals_defined_later() {
    const CODE: &str = r#"fn show() {
  return later;
}
let later = "defined";
print(show()); // expect: defined
"#;
    check(CODE);
}

#[test]
fn type_errors() {
    const CODE: &str = r#"print("a" + 1); // expect runtime error: operands must be two strings or two numerics
"#;
    check(CODE);
    check(
        r#"print("a" * 2); // expect runtime error: operands must be two numerics
"#,
    );
    check(
        r#"print(-"a"); // expect runtime error: operand must be a numeric
"#,
    );
}
