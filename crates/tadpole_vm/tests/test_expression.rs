mod common;

use common::check;

#[test]
fn arithmetic_precedence() {
    const CODE: &str = r#"print(1 + 2 * 3); // expect: 7
print((1 + 2) * 3); // expect: 9
print(-(4 - 6) / 2); // expect: 1
print(7 / 2); // expect: 3.5
print(10 - 4 - 3); // expect: 3
print(--2); // expect: 2
"#;
    check(CODE);
}

#[test]
fn strings_concatenate() {
    const CODE: &str = r#"let greeting = "hello" + ", " + "world";
print(greeting); // expect: hello, world
print(str(12) + "!"); // expect: 12!
print(str(0.5) + str(nil)); // expect: 0.5nil
"#;
    check(CODE);
}

#[test]
fn print_separates_arguments() {
    const CODE: &str = r#"print("a", 1, nil, true, false); // expect: a 1 nil true false
print(1.25, -3); // expect: 1.25 -3
"#;
    check(CODE);
}

#[test]
fn assignment_is_right_associative() {
    const CODE: &str = r#"let a = 1;
let b = 2;
a = b = 3;
print(a, b); // expect: 3 3
{
  let c;
  let d;
  c = d = "local";
  print(c, d); // expect: local local
}
"#;
    check(CODE);
}

#[test]
fn comments_are_ignored() {
    const CODE: &str = r#"// a comment on its own line
print("ok"); // expect: ok
// print("not printed");
"#;
    check(CODE);
}
