//! Behavioural tests for nested answers raised from handlers.

use std::cell::RefCell;
use std::collections::BTreeMap;

use courier_protocol::{AuthInfo, Command, Notification};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use url::Url;

use super::support::{self, World};

#[fixture]
fn world() -> RefCell<World> {
    RefCell::new(support::world())
}

#[given("the controller sets metadata {key} to {value}")]
fn given_metadata(world: &RefCell<World>, key: String, value: String) {
    let entries = BTreeMap::from([(
        key.trim_matches('"').to_owned(),
        value.trim_matches('"').to_owned(),
    )]);
    world.borrow().send(Command::Metadata { entries });
}

#[when("the controller connects and answers the prompt as {user}")]
fn when_prompt_answered(world: &RefCell<World>, user: String) {
    let mut world = world.borrow_mut();
    world.connect_until_prompt();
    let mut reply = AuthInfo::for_url(Url::parse("memfs://localhost/").expect("url"));
    reply.username = user.trim_matches('"').to_owned();
    reply.password = String::from("secret");
    world.send(Command::CredentialAnswer { auth: Some(reply) });
    world.finish_operation();
}

#[when("the controller connects and cancels the prompt")]
fn when_prompt_cancelled(world: &RefCell<World>) {
    let mut world = world.borrow_mut();
    world.connect_until_prompt();
    world.send(Command::CredentialAnswer { auth: None });
    world.finish_operation();
}

#[when("the controller connects and answers the prompt with stat")]
fn when_prompt_mismatched(world: &RefCell<World>) {
    let mut world = world.borrow_mut();
    world.connect_until_prompt();
    world.send(Command::Stat {
        url: Url::parse("memfs:/hello.txt").expect("url"),
    });
    world.finish_operation();
}

#[when("the controller connects and closes the channel at the prompt")]
fn when_channel_closed_at_prompt(world: &RefCell<World>) {
    let mut world = world.borrow_mut();
    world.connect_until_prompt();
    world.stop();
}

#[when("the controller connects")]
fn when_connects(world: &RefCell<World>) {
    world.borrow_mut().run_operation(Command::Connect);
}

#[then("the operation reports connected")]
fn then_connected(world: &RefCell<World>) {
    let world = world.borrow();
    assert_eq!(
        world.last().last(),
        Some(&Notification::Connected),
        "frames: {:?}",
        world.last()
    );
}

#[then("the worker greeted {user}")]
fn then_greeted(world: &RefCell<World>, user: String) {
    let expected = Notification::InfoMessage {
        message: format!("welcome {}", user.trim_matches('"')),
    };
    assert!(world.borrow().last().contains(&expected));
}

#[then("no prompt was shown")]
fn then_no_prompt(world: &RefCell<World>) {
    let world = world.borrow();
    assert_eq!(world.prompts(), 0);
    assert!(
        !world
            .last()
            .iter()
            .any(|frame| matches!(frame, Notification::CredentialPrompt { .. }))
    );
}

#[scenario(path = "tests/features/answers.feature", index = 0)]
fn accepted_prompt_connects(#[from(world)] world: RefCell<World>) {
    drop(world);
}

#[scenario(path = "tests/features/answers.feature", index = 1)]
fn cancelled_prompt_fails(#[from(world)] world: RefCell<World>) {
    drop(world);
}

#[scenario(path = "tests/features/answers.feature", index = 2)]
fn unexpected_frame_fails(#[from(world)] world: RefCell<World>) {
    drop(world);
}

#[scenario(path = "tests/features/answers.feature", index = 3)]
fn closed_channel_stops_worker(#[from(world)] world: RefCell<World>) {
    drop(world);
}

#[scenario(path = "tests/features/answers.feature", index = 4)]
fn no_prompt_without_login(#[from(world)] world: RefCell<World>) {
    drop(world);
}
