mod common;

use common::check;

#[test]
fn counter_activations_are_independent() {
    const CODE: &str = r#"fn counter() {
  let n = 0;
  fn inc() {
    n = n + 1;
    return n;
  }
  return inc;
}
let a = counter();
print(a()); // expect: 1
print(a()); // expect: 2
let b = counter();
print(b()); // expect: 1
print(a()); // expect: 3
"#;
    check(CODE);
}

#[test]
fn sibling_closures_share_a_captured_local() {
    const CODE: &str = r#"let getter;
let setter;
fn make() {
  let shared = "before";
  fn get() {
    return shared;
  }
  fn set(value) {
    shared = value;
  }
  getter = get;
  setter = set;
  set("inside");
  print(shared); // expect: inside
}
make();
print(getter()); // expect: inside
setter("after");
print(getter()); // expect: after
"#;
    check(CODE);
}

#[test]
fn closed_values_are_frozen_per_activation() {
    const CODE: &str = r#"fn capture(value) {
  fn read() {
    return value;
  }
  return read;
}
let one = capture(1);
let two = capture(2);
print(one()); // expect: 1
print(two()); // expect: 2
print(one()); // expect: 1
"#;
    check(CODE);
}

#[test]
fn captures_see_assignments_made_before_return() {
    const CODE: &str = r#"fn snapshot() {
  let x = "a";
  fn read() {
    return x;
  }
  x = "b";
  return read;
}
print(snapshot()()); // expect: b
"#;
    check(CODE);
}

#[test]
fn block_locals_outlive_their_block() {
    const CODE: &str = r#"let f;
{
  let local = "block";
  fn show() {
    return local;
  }
  f = show;
}
print(f()); // expect: block
"#;
    check(CODE);
}

#[test]
fn upvalues_thread_through_intermediate_functions() {
    const CODE: &str = r#"fn outer() {
  let x = "outer";
  fn middle() {
    fn inner() {
      return x;
    }
    return inner;
  }
  return middle;
}
print(outer()()()); // expect: outer
"#;
    check(CODE);
}

#[test]
fn closing_one_local_leaves_others_open() {
    const CODE: &str = r#"let closure;
{
  let a = "a";
  {
    let b = "b";
    fn return_a() {
      return a;
    }
    closure = return_a;
  }
  a = "changed";
  print(closure()); // expect: changed
}
print(closure()); // expect: changed
"#;
    check(CODE);
}

#[test]
fn shadowed_capture() {
    const CODE: &str = r#"{
  let foo = "closure";
  fn f() {
    {
      print(foo); // expect: closure
      let foo = "shadow";
      print(foo); // expect: shadow
    }
    print(foo); // expect: closure
  }
  f();
}
"#;
    check(CODE);
}

#[test]
fn closures_print_as_their_function() {
    const CODE: &str = r#"fn named() {}
print(named); // expect: <fn named>
print(print); // expect: <native fn print>
"#;
    check(CODE);
}
