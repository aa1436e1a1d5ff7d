use colored::*;

use crate::core::{
    CommandRunner, CompletionClient, Conversation, Prompter, Result, RetryDecision,
};
use crate::services::history::HistoryLog;
use crate::services::shell::is_on_path;
use crate::ui::spinner::Spinner;

/// How a session came to rest. A decline is a normal outcome, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Success,
    Declined,
}

/// Drives one session from instruction to resolution: ask the model for a
/// command, run it, and on any diagnostic feed the failure back into the
/// conversation until the command runs clean or the user bows out.
pub struct Session<C, R, P> {
    client: C,
    runner: R,
    prompter: P,
    conversation: Conversation,
    history: Option<HistoryLog>,
    confirm: bool,
}

impl<C, R, P> Session<C, R, P>
where
    C: CompletionClient,
    R: CommandRunner,
    P: Prompter,
{
    pub fn new(
        client: C,
        runner: R,
        prompter: P,
        conversation: Conversation,
        history: Option<HistoryLog>,
        confirm: bool,
    ) -> Self {
        Session {
            client,
            runner,
            prompter,
            conversation,
            history,
            confirm,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub async fn run(&mut self, instruction: &str) -> Result<SessionEnd> {
        self.conversation.push_user(instruction);

        loop {
            let command = self.next_command().await?;
            self.present(&command);

            if self.confirm && !self.confirm_execution()? {
                return Ok(SessionEnd::Declined);
            }

            let outcome = self.runner.run(&command)?;
            let Some(diagnostic) = outcome.diagnostic else {
                println!("\n{}", "✓ done".green().bold());
                return Ok(SessionEnd::Success);
            };

            eprintln!("\n{} {}", "✗".red().bold(), diagnostic.red());
            self.conversation.push_user(format!("I got this: {}", diagnostic));

            match self.ask_retry()? {
                RetryDecision::Abort => return Ok(SessionEnd::Declined),
                RetryDecision::Retry => {}
                RetryDecision::Feedback(text) => self.conversation.push_user(text),
            }
        }
    }

    /// One completion round: exactly one client call, its reply appended as
    /// the assistant turn and checkpointed to the history log. The spinner
    /// is stopped and joined before this returns, success or not.
    async fn next_command(&mut self) -> Result<String> {
        let spinner = Spinner::start("thinking");
        let result = self.client.complete(self.conversation.messages()).await;
        spinner.stop().await;
        let command = result?;

        self.conversation.push_assistant(&command);
        if let Some(log) = &self.history {
            if let Some((user_text, assistant_text)) = self.conversation.last_turn() {
                log.append(user_text, assistant_text)?;
            }
        }
        Ok(command)
    }

    fn present(&self, command: &str) {
        println!("\n{} {}", "⚡ command:".blue().bold(), command.yellow());
        if !is_on_path(command) {
            let program = command.split_whitespace().next().unwrap_or(command);
            println!(
                "{}",
                format!("  note: '{}' was not found on this system", program).yellow()
            );
        }
    }

    /// Empty or affirmative proceeds; anything else declines the session.
    fn confirm_execution(&mut self) -> Result<bool> {
        let Some(reply) = self.prompter.read_line("Run this command? (Y/n): ")? else {
            return Ok(false);
        };
        let reply = reply.trim().to_lowercase();
        Ok(reply.is_empty() || reply == "y")
    }

    fn ask_retry(&mut self) -> Result<RetryDecision> {
        let Some(reply) = self
            .prompter
            .read_line("Find a fix? (Y/n, or describe the problem): ")?
        else {
            return Ok(RetryDecision::Abort);
        };
        Ok(RetryDecision::parse(&reply))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::core::{Error, ExecutionOutcome, Message, Role};
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct FakeClient {
        replies: Arc<Mutex<VecDeque<String>>>,
        requests: Arc<Mutex<Vec<Vec<Message>>>>,
    }

    impl FakeClient {
        fn scripted(replies: &[&str]) -> Self {
            FakeClient {
                replies: Arc::new(Mutex::new(
                    replies.iter().map(|r| r.to_string()).collect(),
                )),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_request(&self) -> Vec<Message> {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl CompletionClient for FakeClient {
        async fn complete(&self, messages: &[Message]) -> Result<String> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::CompletionError("script exhausted".to_string()))
        }
    }

    #[derive(Clone, Default)]
    struct FakeRunner {
        outcomes: Arc<Mutex<VecDeque<ExecutionOutcome>>>,
        runs: Arc<Mutex<Vec<String>>>,
    }

    impl FakeRunner {
        fn scripted(outcomes: Vec<ExecutionOutcome>) -> Self {
            FakeRunner {
                outcomes: Arc::new(Mutex::new(outcomes.into())),
                runs: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn runs(&self) -> usize {
            self.runs.lock().unwrap().len()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, command: &str) -> Result<ExecutionOutcome> {
            self.runs.lock().unwrap().push(command.to_string());
            Ok(self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(ExecutionOutcome::success))
        }
    }

    struct FakePrompt {
        replies: VecDeque<String>,
    }

    impl FakePrompt {
        fn scripted(replies: &[&str]) -> Self {
            FakePrompt {
                replies: replies.iter().map(|r| r.to_string()).collect(),
            }
        }

        fn silent() -> Self {
            FakePrompt {
                replies: VecDeque::new(),
            }
        }
    }

    impl Prompter for FakePrompt {
        fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
            Ok(self.replies.pop_front())
        }
    }

    fn failed(diagnostic: &str) -> ExecutionOutcome {
        ExecutionOutcome {
            succeeded: false,
            diagnostic: Some(diagnostic.to_string()),
        }
    }

    fn count_role(conversation: &Conversation, role: Role) -> usize {
        conversation
            .messages()
            .iter()
            .filter(|m| m.role == role)
            .count()
    }

    #[tokio::test]
    async fn clean_run_ends_after_one_round() {
        let client = FakeClient::scripted(&["ls -la"]);
        let runner = FakeRunner::scripted(vec![ExecutionOutcome::success()]);
        let mut session = Session::new(
            client.clone(),
            runner.clone(),
            FakePrompt::silent(),
            Conversation::new("contract"),
            None,
            false,
        );

        let end = session.run("list files").await.unwrap();

        assert_eq!(end, SessionEnd::Success);
        assert_eq!(client.calls(), 1);
        assert_eq!(runner.runs(), 1);
        // system, user, assistant and nothing else.
        assert_eq!(session.conversation().messages().len(), 3);
    }

    #[tokio::test]
    async fn n_failures_then_success_accumulates_n_error_reports() {
        let client = FakeClient::scripted(&["cmd one", "cmd two", "cmd three"]);
        let runner = FakeRunner::scripted(vec![
            failed("stderr: no such file"),
            failed("the command exited with status 1"),
            ExecutionOutcome::success(),
        ]);
        let mut session = Session::new(
            client.clone(),
            runner.clone(),
            FakePrompt::scripted(&["", "y"]),
            Conversation::new("contract"),
            None,
            false,
        );

        let end = session.run("do the thing").await.unwrap();

        assert_eq!(end, SessionEnd::Success);
        assert_eq!(client.calls(), 3);
        assert_eq!(runner.runs(), 3);
        let conversation = session.conversation();
        assert_eq!(count_role(conversation, Role::Assistant), 3);
        let error_reports = conversation
            .messages()
            .iter()
            .filter(|m| m.role == Role::User && m.content.starts_with("I got this: "))
            .count();
        assert_eq!(error_reports, 2);
    }

    #[tokio::test]
    async fn declining_retry_halts_without_another_completion() {
        let client = FakeClient::scripted(&["open nonexistent.app"]);
        let runner = FakeRunner::scripted(vec![failed("the command exited with status 1")]);
        let mut session = Session::new(
            client.clone(),
            runner.clone(),
            FakePrompt::scripted(&["n"]),
            Conversation::new("contract"),
            None,
            false,
        );

        let end = session.run("open nonexistent.app").await.unwrap();

        assert_eq!(end, SessionEnd::Declined);
        assert_eq!(client.calls(), 1);
        let conversation = session.conversation();
        assert_eq!(count_role(conversation, Role::Assistant), 1);
        assert_eq!(count_role(conversation, Role::User), 2);
    }

    #[tokio::test]
    async fn custom_feedback_is_sent_verbatim() {
        let client = FakeClient::scripted(&["cat file", "cat -v file"]);
        let runner = FakeRunner::scripted(vec![
            failed("stderr: binary garbage"),
            ExecutionOutcome::success(),
        ]);
        let mut session = Session::new(
            client.clone(),
            runner.clone(),
            FakePrompt::scripted(&["show nonprinting characters too"]),
            Conversation::new("contract"),
            None,
            false,
        );

        session.run("show the file").await.unwrap();

        let request = client.last_request();
        let last = request.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "show nonprinting characters too");
    }

    #[tokio::test]
    async fn confirm_mode_declines_before_running_anything() {
        let client = FakeClient::scripted(&["rm -rf /tmp/scratch"]);
        let runner = FakeRunner::scripted(vec![]);
        let mut session = Session::new(
            client.clone(),
            runner.clone(),
            FakePrompt::scripted(&["no way"]),
            Conversation::new("contract"),
            None,
            true,
        );

        let end = session.run("clean the scratch dir").await.unwrap();

        assert_eq!(end, SessionEnd::Declined);
        assert_eq!(runner.runs(), 0);
    }

    #[tokio::test]
    async fn confirm_mode_empty_reply_proceeds() {
        let client = FakeClient::scripted(&["ls"]);
        let runner = FakeRunner::scripted(vec![ExecutionOutcome::success()]);
        let mut session = Session::new(
            client.clone(),
            runner.clone(),
            FakePrompt::scripted(&[""]),
            Conversation::new("contract"),
            None,
            true,
        );

        let end = session.run("list files").await.unwrap();

        assert_eq!(end, SessionEnd::Success);
        assert_eq!(runner.runs(), 1);
    }

    #[tokio::test]
    async fn closed_input_reads_as_a_decline() {
        let client = FakeClient::scripted(&["ls"]);
        let runner = FakeRunner::scripted(vec![failed("stderr: boom")]);
        let mut session = Session::new(
            client.clone(),
            runner.clone(),
            FakePrompt::silent(),
            Conversation::new("contract"),
            None,
            false,
        );

        let end = session.run("list files").await.unwrap();

        assert_eq!(end, SessionEnd::Declined);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn each_round_checkpoints_one_history_pair() {
        let dir = tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("mem.txt"));
        let client = FakeClient::scripted(&["cmd one", "cmd two"]);
        let runner = FakeRunner::scripted(vec![
            failed("stderr: nope"),
            ExecutionOutcome::success(),
        ]);
        let mut session = Session::new(
            client,
            runner,
            FakePrompt::scripted(&[""]),
            Conversation::new("contract"),
            Some(log),
            false,
        );

        session.run("do the thing").await.unwrap();

        let persisted = HistoryLog::new(dir.path().join("mem.txt")).load();
        assert_eq!(persisted.len(), 4);
        assert_eq!(persisted[0], Message::user("do the thing"));
        assert_eq!(persisted[1], Message::assistant("cmd one"));
        assert_eq!(persisted[2], Message::user("I got this: stderr: nope"));
        assert_eq!(persisted[3], Message::assistant("cmd two"));
    }

    #[tokio::test]
    async fn decline_leaves_exactly_one_persisted_pair() {
        let dir = tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("mem.txt"));
        let client = FakeClient::scripted(&["open nonexistent.app"]);
        let runner = FakeRunner::scripted(vec![failed("the command exited with status 1")]);
        let mut session = Session::new(
            client,
            runner,
            FakePrompt::scripted(&["n"]),
            Conversation::new("contract"),
            Some(log),
            false,
        );

        session.run("open nonexistent.app").await.unwrap();

        let persisted = HistoryLog::new(dir.path().join("mem.txt")).load();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[1], Message::assistant("open nonexistent.app"));
    }

    #[tokio::test]
    async fn completion_failure_is_fatal_for_the_round() {
        let client = FakeClient::scripted(&[]);
        let runner = FakeRunner::scripted(vec![]);
        let mut session = Session::new(
            client,
            runner.clone(),
            FakePrompt::silent(),
            Conversation::new("contract"),
            None,
            false,
        );

        let result = session.run("list files").await;

        assert!(matches!(result, Err(Error::CompletionError(_))));
        assert_eq!(runner.runs(), 0);
    }
}
