//! Hero Form Component
//!
//! Form for adding a superhero. Values live in the shared `HeroForm`, so
//! validation and the success/failure rules are the same as in the terminal
//! client.

use leptos::*;

use humble_heroes::hero::FormField;

use crate::state::global::GlobalState;

#[component]
pub fn HeroFormPanel() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let submit_state = state.clone();
    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        submit_state.submit();
    };

    let submitting = state.submitting;
    let form = state.form;

    view! {
        <section>
            <h2>"Add a Humble Superhero"</h2>
            <form on:submit=on_submit>
                <FieldInput field=FormField::Name label="Name" input_type="text" />
                <FieldInput field=FormField::Superpower label="Superpower" input_type="text" />
                <FieldInput field=FormField::HumilityScore label="Humility score (1-10)" input_type="number" />

                {move || {
                    form.with(|f| f.error_message().map(str::to_string)).map(|message| view! {
                        <p class="form-error">{message}</p>
                    })
                }}

                <button type="submit" disabled=move || submitting.get()>
                    {move || if submitting.get() { "Adding..." } else { "Add Superhero" }}
                </button>
            </form>
        </section>
    }
}

#[component]
fn FieldInput(field: FormField, label: &'static str, input_type: &'static str) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let form = state.form;
    let is_score = field == FormField::HumilityScore;

    view! {
        <label>
            {label}
            <input
                type=input_type
                name=field.input_name()
                required=true
                step=is_score.then_some("0.1")
                prop:value=move || form.with(|f| f.value(field).to_string())
                on:input=move |ev| state.set_field(field, event_target_value(&ev))
            />
        </label>
    }
}
