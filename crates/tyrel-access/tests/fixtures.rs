//! Shared shop model for member-path tests.
//!
//! ```text
//! class List<T>   { int Count { get; }  T First { get; }  T this[int];  bool Contains(T) }
//! class Bag       { object this[int] }
//! class Address   { string City;  long Zip { get; set; }  readonly string Label;  string Format() }
//! class Order     { double Total }
//! class OrderList : List<Order>
//! class Customer  {
//!     string Name;  Address Address;  List<Order> Orders;  OrderList Recent;
//!     string[] Tags;  Bag Misc;  readonly long Id;  string Secret { set; }
//!     static long Count;  static Customer Default { get; }
//!     string Describe();  string Greet(string);  string Greet(object);
//!     string Greet(string, long);  static Customer Create(string)
//! }
//! ```

use crate::resolver::MemberPathResolver;
use std::sync::Arc;
use tyrel_model::{
    HostArray, HostObject, IndexerInfo, MemberInfo, ModelError, ObjectRef, TypeComposition, TypeDecl, TypeId,
    TypeStore, Value,
};

pub(crate) struct Shop {
    pub store: Arc<TypeStore>,
    pub resolver: MemberPathResolver<TypeStore>,
    pub list: TypeId,
    pub bag: TypeId,
    pub address: TypeId,
    pub order: TypeId,
    pub order_list: TypeId,
    pub customer: TypeId,
    pub list_of_orders: TypeId,
    pub string_array: TypeId,
    pub default_customer: ObjectRef,
}

fn receiver(this: Option<&Value>) -> Result<&ObjectRef, ModelError> {
    this.and_then(Value::as_object)
        .ok_or_else(|| ModelError::Host("missing receiver".into()))
}

fn text(value: &Value) -> String {
    match value {
        Value::Str(s) => s.to_string(),
        other => format!("{other:?}"),
    }
}

impl Shop {
    pub fn order(&self, total: f64) -> Value {
        let order = HostObject::new(self.order);
        order.set_field("Total", Value::Float(total));
        Value::Object(order)
    }

    /// A customer with an address, two orders, one recent order, two tags
    /// and a bag of mixed items.
    pub fn customer_value(&self, name: &str) -> Value {
        let customer = HostObject::new(self.customer);
        customer.set_field("Name", Value::from(name));
        customer.set_field("Id", Value::Int(7));

        let address = HostObject::new(self.address);
        address.set_field("City", Value::from("Oslo"));
        address.set_field("zip", Value::Int(150));
        customer.set_field("Address", Value::Object(address));

        let orders = HostObject::with_items(self.list_of_orders, vec![self.order(10.5), self.order(20.0)]);
        customer.set_field("Orders", Value::Object(orders));

        let recent = HostObject::with_items(self.order_list, vec![self.order(7.0)]);
        customer.set_field("Recent", Value::Object(recent));

        let tags = HostArray::new(self.string_array, vec![Value::from("new"), Value::from("vip")]);
        customer.set_field("Tags", Value::Array(tags));

        let bag = HostObject::with_items(self.bag, vec![Value::Int(1), Value::from("x")]);
        customer.set_field("Misc", Value::Object(bag));

        Value::Object(customer)
    }
}

pub(crate) fn shop() -> Shop {
    let store = Arc::new(TypeStore::new());

    let list = store.declare(TypeDecl::class("List").with_params(&["T"]));
    let bag = store.declare(TypeDecl::class("Bag"));
    let address = store.declare(TypeDecl::class("Address"));
    let order = store.declare(TypeDecl::class("Order"));
    let order_list = store.declare(TypeDecl::class("OrderList"));
    let customer = store.declare(TypeDecl::class("Customer"));

    let default_customer = HostObject::new(customer);
    default_customer.set_field("Name", Value::from("Default"));

    let wire = || -> Result<(TypeId, TypeId), ModelError> {
        let t = store.param(list, 0).ok_or(ModelError::UnknownType(list))?;
        store.add_member(
            list,
            MemberInfo::property("Count", TypeId::LONG)
                .with_getter(|this| Ok(Value::Int(receiver(this)?.item_count() as i64))),
        )?;
        store.add_member(
            list,
            MemberInfo::property("First", t).with_getter(|this| Ok(receiver(this)?.item(0).unwrap_or_default())),
        )?;
        store.add_member(
            list,
            MemberInfo::method("Contains", TypeId::BOOL, vec![t], |this, args| {
                let list = receiver(this)?;
                let found = (0..list.item_count()).any(|i| list.item(i).is_some_and(|item| item.same_as(&args[0])));
                Ok(Value::Bool(found))
            }),
        )?;
        store.set_indexer(list, IndexerInfo::items(t))?;

        store.set_indexer(bag, IndexerInfo::items(TypeId::OBJECT))?;

        store.add_member(address, MemberInfo::field("City", TypeId::STRING))?;
        store.add_member(
            address,
            MemberInfo::property("Zip", TypeId::LONG)
                .with_getter(|this| Ok(receiver(this)?.field("zip")))
                .with_setter(|this, value| {
                    receiver(this)?.set_field("zip", value);
                    Ok(())
                }),
        )?;
        store.add_member(address, MemberInfo::readonly_field("Label", TypeId::STRING))?;
        store.add_member(
            address,
            MemberInfo::method("Format", TypeId::STRING, Vec::new(), |this, _| {
                let address = receiver(this)?;
                Ok(Value::from(format!(
                    "{} {}",
                    text(&address.field("City")),
                    text(&address.field("zip"))
                )))
            }),
        )?;

        store.add_member(order, MemberInfo::field("Total", TypeId::DOUBLE))?;

        let list_of_orders = store.make_generic_type(list, &[order])?;
        store.set_base(order_list, list_of_orders)?;
        let string_array = store.make_array_type(TypeId::STRING, 1)?;

        store.add_member(customer, MemberInfo::field("Name", TypeId::STRING))?;
        store.add_member(customer, MemberInfo::field("Address", address))?;
        store.add_member(customer, MemberInfo::field("Orders", list_of_orders))?;
        store.add_member(customer, MemberInfo::field("Recent", order_list))?;
        store.add_member(customer, MemberInfo::field("Tags", string_array))?;
        store.add_member(customer, MemberInfo::field("Misc", bag))?;
        store.add_member(customer, MemberInfo::readonly_field("Id", TypeId::LONG))?;
        store.add_member(
            customer,
            MemberInfo::property("Secret", TypeId::STRING).with_setter(|this, value| {
                receiver(this)?.set_field("secret", value);
                Ok(())
            }),
        )?;
        store.add_member(customer, MemberInfo::static_field("Count", TypeId::LONG, Value::Int(0)))?;
        let default_value = Value::Object(default_customer.clone());
        store.add_member(
            customer,
            MemberInfo::property("Default", customer)
                .with_getter(move |_| Ok(default_value.clone()))
                .into_static(),
        )?;
        store.add_member(
            customer,
            MemberInfo::method("Describe", TypeId::STRING, Vec::new(), |this, _| {
                Ok(Value::from(format!("customer {}", text(&receiver(this)?.field("Name")))))
            }),
        )?;
        store.add_member(
            customer,
            MemberInfo::method("Greet", TypeId::STRING, vec![TypeId::STRING], |_, args| {
                Ok(Value::from(format!("hello {}", text(&args[0]))))
            }),
        )?;
        store.add_member(
            customer,
            MemberInfo::method("Greet", TypeId::STRING, vec![TypeId::OBJECT], |_, _| {
                Ok(Value::from("hello object"))
            }),
        )?;
        store.add_member(
            customer,
            MemberInfo::method(
                "Greet",
                TypeId::STRING,
                vec![TypeId::STRING, TypeId::LONG],
                |_, args| {
                    let times = match args[1] {
                        Value::Int(n) => n.max(0) as usize,
                        _ => 1,
                    };
                    Ok(Value::from(vec![format!("hello {}", text(&args[0])); times].join(" ")))
                },
            ),
        )?;
        store.add_member(
            customer,
            MemberInfo::method("Create", customer, vec![TypeId::STRING], move |_, args| {
                let created = HostObject::new(customer);
                created.set_field("Name", args[0].clone());
                Ok(Value::Object(created))
            })
            .into_static(),
        )?;
        Ok((list_of_orders, string_array))
    };
    let (list_of_orders, string_array) = wire().expect("shop wiring succeeds");

    let resolver = MemberPathResolver::new(store.clone());
    Shop {
        store,
        resolver,
        list,
        bag,
        address,
        order,
        order_list,
        customer,
        list_of_orders,
        string_array,
        default_customer,
    }
}
