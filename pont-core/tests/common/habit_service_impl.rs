use habits_service::HabitService;
use habits_service::pb::{
    Completion, CreateHabitRequest, CreateHabitResponse, GetAllHabitsRequest,
    GetAllHabitsResponse, GetHabitHistoryRequest, GetHabitHistoryResponse, Habit,
    LogHabitCompletionRequest, LogHabitCompletionResponse,
};
use std::sync::Mutex;
use tonic::{Request, Response, Status};

// An in-memory backend, just enough business logic to observe the proxy end to end.
#[derive(Default)]
pub struct HabitServiceImpl {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    habits: Vec<Habit>,
    completions: Vec<Completion>,
}

#[tonic::async_trait]
impl HabitService for HabitServiceImpl {
    async fn create_habit(
        &self,
        request: Request<CreateHabitRequest>,
    ) -> Result<Response<CreateHabitResponse>, Status> {
        let name = request.into_inner().name;

        if name.trim().is_empty() {
            return Err(Status::invalid_argument("habit name must not be empty"));
        }

        let mut state = self.state.lock().unwrap();

        if state.habits.iter().any(|h| h.name == name) {
            return Err(Status::already_exists(format!("habit '{name}' already exists")));
        }

        let habit = Habit {
            id: state.habits.len() as i32 + 1,
            name,
        };
        state.habits.push(habit.clone());

        Ok(Response::new(CreateHabitResponse {
            id: habit.id,
            name: habit.name,
        }))
    }

    async fn get_all_habits(
        &self,
        _request: Request<GetAllHabitsRequest>,
    ) -> Result<Response<GetAllHabitsResponse>, Status> {
        let state = self.state.lock().unwrap();

        Ok(Response::new(GetAllHabitsResponse {
            habits: state.habits.clone(),
        }))
    }

    async fn log_habit_completion(
        &self,
        request: Request<LogHabitCompletionRequest>,
    ) -> Result<Response<LogHabitCompletionResponse>, Status> {
        let request = request.into_inner();
        let mut state = self.state.lock().unwrap();

        if !state.habits.iter().any(|h| h.name == request.habit_name) {
            return Err(Status::not_found(format!(
                "habit '{}' not found",
                request.habit_name
            )));
        }

        let completion = Completion {
            id: state.completions.len() as i32 + 1,
            habit_name: request.habit_name,
            timestamp: request.timestamp,
        };
        state.completions.push(completion.clone());

        Ok(Response::new(LogHabitCompletionResponse {
            completion: Some(completion),
        }))
    }

    async fn get_habit_history(
        &self,
        request: Request<GetHabitHistoryRequest>,
    ) -> Result<Response<GetHabitHistoryResponse>, Status> {
        let habit_name = request.into_inner().habit_name;
        let state = self.state.lock().unwrap();

        let completions = state
            .completions
            .iter()
            .filter(|c| c.habit_name == habit_name)
            .cloned()
            .collect();

        Ok(Response::new(GetHabitHistoryResponse { completions }))
    }
}
